//! SQL Server dialect implementation.

use crate::models::{DataType, TimeGrain};

use super::{Dialect, GrainExpr};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn grain_expr(&self, col: &str, _data_type: DataType, grain: TimeGrain) -> GrainExpr {
        match grain {
            TimeGrain::Year => GrainExpr::value(format!("YEAR({col})")),
            TimeGrain::Quarter => {
                GrainExpr::value(format!("CONCAT('Q', DATEPART(QUARTER, {col}))"))
            }
            TimeGrain::Month => {
                GrainExpr::sorted_by(format!("DATENAME(MONTH, {col})"), format!("MONTH({col})"))
            }
            TimeGrain::YearQuarter => GrainExpr::value(format!(
                "CONCAT(YEAR({col}), '-Q', DATEPART(QUARTER, {col}))"
            )),
            TimeGrain::YearMonth => GrainExpr::value(format!("FORMAT({col}, 'yyyy-MM')")),
            TimeGrain::Date => GrainExpr::value(format!("CAST({col} AS DATE)")),
            TimeGrain::DayOfWeek => GrainExpr::sorted_by(
                format!("DATENAME(WEEKDAY, {col})"),
                format!("DATEPART(WEEKDAY, {col})"),
            ),
            TimeGrain::DayOfMonth => GrainExpr::value(format!("DAY({col})")),
        }
    }

    fn render_literal(&self, value: &serde_json::Value) -> String {
        match value {
            // No boolean literals in T-SQL
            serde_json::Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            serde_json::Value::String(s) => format!("N'{}'", s.replace('\'', "''")),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| self.render_literal(v))
                .collect::<Vec<_>>()
                .join(", "),
            serde_json::Value::Null => "NULL".to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Object(_) => format!("N'{}'", value.to_string().replace('\'', "''")),
        }
    }
}
