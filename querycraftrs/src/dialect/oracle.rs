//! Oracle dialect implementation.

use crate::dataset::DatasetTable;
use crate::models::{DataType, TimeGrain};

use super::{Dialect, GrainExpr};

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn qualify_table(&self, table: &DatasetTable) -> String {
        match table.schema.as_deref() {
            Some(schema) if !schema.is_empty() => format!("{schema}.{}", table.table),
            _ => table.table.clone(),
        }
    }

    /// Oracle rejects `AS` before a table alias.
    fn alias_table(&self, qualified: &str, alias: &str) -> String {
        format!("{qualified} {alias}")
    }

    fn grain_expr(&self, col: &str, _data_type: DataType, grain: TimeGrain) -> GrainExpr {
        match grain {
            TimeGrain::Year => GrainExpr::value(format!("EXTRACT(YEAR FROM {col})")),
            TimeGrain::Quarter => GrainExpr::value(format!("'Q' || TO_CHAR({col}, 'Q')")),
            TimeGrain::Month => GrainExpr::sorted_by(
                format!("TRIM(TO_CHAR({col}, 'Month'))"),
                format!("EXTRACT(MONTH FROM {col})"),
            ),
            TimeGrain::YearQuarter => {
                GrainExpr::value(format!("TO_CHAR({col}, 'YYYY') || '-Q' || TO_CHAR({col}, 'Q')"))
            }
            TimeGrain::YearMonth => GrainExpr::value(format!("TO_CHAR({col}, 'YYYY-MM')")),
            TimeGrain::Date => GrainExpr::value(format!("TRUNC({col})")),
            TimeGrain::DayOfWeek => GrainExpr::sorted_by(
                format!("TRIM(TO_CHAR({col}, 'Day'))"),
                format!("TO_NUMBER(TO_CHAR({col}, 'D'))"),
            ),
            TimeGrain::DayOfMonth => GrainExpr::value(format!("EXTRACT(DAY FROM {col})")),
        }
    }

    fn render_literal(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| self.render_literal(v))
                .collect::<Vec<_>>()
                .join(", "),
            serde_json::Value::Null => "NULL".to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            serde_json::Value::Object(_) => format!("'{}'", value.to_string().replace('\'', "''")),
        }
    }
}
