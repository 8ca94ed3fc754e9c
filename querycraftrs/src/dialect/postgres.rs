//! PostgreSQL dialect implementation, shared with Redshift.

use crate::dataset::DatasetTable;
use crate::models::{DataType, TimeGrain};

use super::{Dialect, GrainExpr};

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn qualify_table(&self, table: &DatasetTable) -> String {
        // A connection is bound to one database; only schema qualifies.
        match table.schema.as_deref() {
            Some(schema) if !schema.is_empty() => format!("{schema}.{}", table.table),
            _ => table.table.clone(),
        }
    }

    fn grain_expr(&self, col: &str, _data_type: DataType, grain: TimeGrain) -> GrainExpr {
        match grain {
            TimeGrain::Year => GrainExpr::value(format!("EXTRACT(YEAR FROM {col})::INTEGER")),
            TimeGrain::Quarter => {
                GrainExpr::value(format!("CONCAT('Q', EXTRACT(QUARTER FROM {col})::INTEGER)"))
            }
            TimeGrain::Month => GrainExpr::sorted_by(
                format!("TRIM(TO_CHAR({col}, 'Month'))"),
                format!("EXTRACT(MONTH FROM {col})::INTEGER"),
            ),
            TimeGrain::YearQuarter => GrainExpr::value(format!(
                "CONCAT(TO_CHAR({col}, 'YYYY'), '-Q', TO_CHAR({col}, 'Q'))"
            )),
            TimeGrain::YearMonth => GrainExpr::value(format!("TO_CHAR({col}, 'YYYY-MM')")),
            TimeGrain::Date => GrainExpr::value(format!("{col}::DATE")),
            TimeGrain::DayOfWeek => GrainExpr::sorted_by(
                format!("TRIM(TO_CHAR({col}, 'Day'))"),
                format!("EXTRACT(DOW FROM {col})::INTEGER + 1"),
            ),
            TimeGrain::DayOfMonth => GrainExpr::value(format!("EXTRACT(DAY FROM {col})::INTEGER")),
        }
    }
}
