//! Databricks (Spark SQL) dialect implementation.

use crate::models::{DataType, TimeGrain};

use super::{Dialect, GrainExpr};

#[derive(Debug, Default, Clone, Copy)]
pub struct DatabricksDialect;

impl Dialect for DatabricksDialect {
    fn name(&self) -> &'static str {
        "databricks"
    }

    fn grain_expr(&self, col: &str, _data_type: DataType, grain: TimeGrain) -> GrainExpr {
        match grain {
            TimeGrain::Year => GrainExpr::value(format!("YEAR({col})")),
            TimeGrain::Quarter => GrainExpr::value(format!("CONCAT('Q', QUARTER({col}))")),
            TimeGrain::Month => GrainExpr::sorted_by(
                format!("DATE_FORMAT({col}, 'MMMM')"),
                format!("MONTH({col})"),
            ),
            TimeGrain::YearQuarter => {
                GrainExpr::value(format!("CONCAT(YEAR({col}), '-Q', QUARTER({col}))"))
            }
            TimeGrain::YearMonth => GrainExpr::value(format!("DATE_FORMAT({col}, 'yyyy-MM')")),
            TimeGrain::Date => GrainExpr::value(format!("DATE({col})")),
            TimeGrain::DayOfWeek => GrainExpr::sorted_by(
                format!("DATE_FORMAT({col}, 'EEEE')"),
                format!("DAYOFWEEK({col})"),
            ),
            TimeGrain::DayOfMonth => GrainExpr::value(format!("DAY({col})")),
        }
    }

    fn render_like_pattern(&self, text: &str, leading: bool, trailing: bool) -> String {
        // Spark string literals treat backslash as an escape
        let escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
        let lead = if leading { "%" } else { "" };
        let trail = if trailing { "%" } else { "" };
        format!("'{lead}{escaped}{trail}'")
    }
}
