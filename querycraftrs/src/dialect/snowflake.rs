//! Snowflake dialect implementation.

use crate::models::{DataType, TimeGrain};

use super::{Dialect, GrainExpr};

#[derive(Debug, Default, Clone, Copy)]
pub struct SnowflakeDialect;

impl Dialect for SnowflakeDialect {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn grain_expr(&self, col: &str, _data_type: DataType, grain: TimeGrain) -> GrainExpr {
        match grain {
            TimeGrain::Year => GrainExpr::value(format!("YEAR({col})")),
            TimeGrain::Quarter => GrainExpr::value(format!("CONCAT('Q', QUARTER({col}))")),
            TimeGrain::Month => {
                GrainExpr::sorted_by(format!("TO_CHAR({col}, 'MMMM')"), format!("MONTH({col})"))
            }
            TimeGrain::YearQuarter => {
                GrainExpr::value(format!("CONCAT(YEAR({col}), '-Q', QUARTER({col}))"))
            }
            TimeGrain::YearMonth => GrainExpr::value(format!("TO_CHAR({col}, 'YYYY-MM')")),
            TimeGrain::Date => GrainExpr::value(format!("TO_DATE({col})")),
            TimeGrain::DayOfWeek => GrainExpr::sorted_by(
                format!("DAYNAME({col})"),
                format!("DAYOFWEEKISO({col})"),
            ),
            TimeGrain::DayOfMonth => GrainExpr::value(format!("DAY({col})")),
        }
    }
}
