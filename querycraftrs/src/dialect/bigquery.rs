//! BigQuery dialect implementation.
//!
//! BigQuery cannot mix window functions with GROUP BY in one projection and
//! orders month/day names through a projected numeric key, so this dialect
//! asks the composer for a two-level statement (see `query_builder::restructure`).

use crate::dataset::DatasetTable;
use crate::models::{DataType, TimeGrain};

use super::{Dialect, GrainExpr};

#[derive(Debug, Default, Clone, Copy)]
pub struct BigQueryDialect;

impl Dialect for BigQueryDialect {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn qualify_table(&self, table: &DatasetTable) -> String {
        // BigQuery quotes the full project.dataset.table path with backticks
        let path: Vec<&str> = [table.database.as_deref(), table.schema.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .chain(std::iter::once(table.table.as_str()))
            .collect();
        format!("`{}`", path.join("."))
    }

    fn hoists_window_functions(&self) -> bool {
        true
    }

    fn selects_sort_keys(&self) -> bool {
        true
    }

    fn grain_expr(&self, col: &str, data_type: DataType, grain: TimeGrain) -> GrainExpr {
        let format_fn = match data_type {
            DataType::Timestamp => "FORMAT_TIMESTAMP",
            _ => "FORMAT_DATE",
        };
        match grain {
            TimeGrain::Year => GrainExpr::value(format!("EXTRACT(YEAR FROM {col})")),
            TimeGrain::Quarter => GrainExpr::value(format!(
                "CONCAT('Q', CAST(EXTRACT(QUARTER FROM {col}) AS STRING))"
            )),
            TimeGrain::Month => GrainExpr::sorted_by(
                format!("{format_fn}('%B', {col})"),
                format!("EXTRACT(MONTH FROM {col})"),
            ),
            TimeGrain::YearQuarter => GrainExpr::value(format!(
                "CONCAT(CAST(EXTRACT(YEAR FROM {col}) AS STRING), '-Q', CAST(EXTRACT(QUARTER FROM {col}) AS STRING))"
            )),
            TimeGrain::YearMonth => GrainExpr::value(format!("{format_fn}('%Y-%m', {col})")),
            TimeGrain::Date => GrainExpr::value(format!("DATE({col})")),
            TimeGrain::DayOfWeek => GrainExpr::sorted_by(
                format!("{format_fn}('%A', {col})"),
                format!("EXTRACT(DAYOFWEEK FROM {col})"),
            ),
            TimeGrain::DayOfMonth => GrainExpr::value(format!("EXTRACT(DAY FROM {col})")),
        }
    }

    fn render_literal(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| self.render_literal(v))
                .collect::<Vec<_>>()
                .join(", "),
            serde_json::Value::Null => "NULL".to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Object(_) => format!("'{}'", value.to_string().replace('\'', "\\'")),
        }
    }

    fn render_like_pattern(&self, text: &str, leading: bool, trailing: bool) -> String {
        let escaped = text.replace('\'', "\\'");
        let lead = if leading { "%" } else { "" };
        let trail = if trailing { "%" } else { "" };
        format!("'{lead}{escaped}{trail}'")
    }
}
