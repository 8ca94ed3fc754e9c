//! SQL dialect abstractions for the supported database vendors.
//!
//! Each vendor group is implemented in its own file. A dialect only renders
//! primitive pieces (time grains, aggregates, window calls, table names);
//! walking a query into clause fragments lives in the query builder.

use std::fmt;
use std::str::FromStr;

use crate::dataset::DatasetTable;
use crate::error::QuerycraftError;
use crate::models::{Aggregation, DataType, TimeGrain, WindowFunction, WindowKind};

mod bigquery;
mod databricks;
mod mysql;
mod oracle;
mod postgres;
mod snowflake;
mod sqlserver;

pub use bigquery::BigQueryDialect;
pub use databricks::DatabricksDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use snowflake::SnowflakeDialect;
pub use sqlserver::SqlServerDialect;

/// Database vendors a query can be composed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Postgres,
    Redshift,
    MySql,
    DuckDb,
    SqlServer,
    BigQuery,
    Databricks,
    Oracle,
    Snowflake,
}

impl Vendor {
    pub const ALL: [Vendor; 9] = [
        Vendor::Postgres,
        Vendor::Redshift,
        Vendor::MySql,
        Vendor::DuckDb,
        Vendor::SqlServer,
        Vendor::BigQuery,
        Vendor::Databricks,
        Vendor::Oracle,
        Vendor::Snowflake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Postgres => "postgresql",
            Vendor::Redshift => "redshift",
            Vendor::MySql => "mysql",
            Vendor::DuckDb => "duckdb",
            Vendor::SqlServer => "sqlserver",
            Vendor::BigQuery => "bigquery",
            Vendor::Databricks => "databricks",
            Vendor::Oracle => "oracle",
            Vendor::Snowflake => "snowflake",
        }
    }

    /// The select builder for this vendor. Postgres and Redshift share one,
    /// as do MySQL and DuckDB.
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            Vendor::Postgres | Vendor::Redshift => &PostgresDialect,
            Vendor::MySql => &mysql::MYSQL,
            Vendor::DuckDb => &mysql::DUCKDB,
            Vendor::SqlServer => &SqlServerDialect,
            Vendor::BigQuery => &BigQueryDialect,
            Vendor::Databricks => &DatabricksDialect,
            Vendor::Oracle => &OracleDialect,
            Vendor::Snowflake => &SnowflakeDialect,
        }
    }
}

impl FromStr for Vendor {
    type Err = QuerycraftError;

    /// Vendor names are matched exactly; `"Oracle"` is not `"oracle"`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Vendor::ALL
            .into_iter()
            .find(|v| v.as_str() == name)
            .ok_or_else(|| QuerycraftError::UnsupportedVendor(name.to_string()))
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value expression for a grained temporal column, plus the numeric key used
/// to order it when the value itself does not sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrainExpr {
    pub value: String,
    pub sort_key: Option<String>,
}

impl GrainExpr {
    pub fn value(value: String) -> Self {
        Self {
            value,
            sort_key: None,
        }
    }

    pub fn sorted_by(value: String, sort_key: String) -> Self {
        Self {
            value,
            sort_key: Some(sort_key),
        }
    }
}

pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn grain_expr(&self, column: &str, data_type: DataType, grain: TimeGrain) -> GrainExpr;

    fn qualify_table(&self, table: &DatasetTable) -> String {
        [table.database.as_deref(), table.schema.as_deref(), Some(table.table.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    fn alias_table(&self, qualified: &str, alias: &str) -> String {
        format!("{qualified} AS {alias}")
    }

    /// Window functions must be computed over an already grouped sub-select.
    fn hoists_window_functions(&self) -> bool {
        false
    }

    /// Sort keys of grained columns are projected so an outer query can drop them.
    fn selects_sort_keys(&self) -> bool {
        false
    }

    fn render_aggregation(&self, agg: Aggregation, expr: &str) -> String {
        match agg {
            Aggregation::Sum => format!("SUM({expr})"),
            Aggregation::Avg => format!("AVG({expr})"),
            Aggregation::Min => format!("MIN({expr})"),
            Aggregation::Max => format!("MAX({expr})"),
            Aggregation::Count => "COUNT(*)".to_string(),
            Aggregation::CountNonNull => format!("COUNT({expr})"),
            Aggregation::CountUnique => format!("COUNT(DISTINCT {expr})"),
            Aggregation::CountNull => {
                format!("SUM(CASE WHEN {expr} IS NULL THEN 1 ELSE 0 END)")
            }
        }
    }

    fn render_window(&self, window: &WindowFunction, value: &str, order_keys: &[String]) -> String {
        let dir = window.direction.as_sql();
        match window.kind {
            WindowKind::Rank => format!("RANK() OVER (ORDER BY {value} {dir})"),
            WindowKind::DenseRank => format!("DENSE_RANK() OVER (ORDER BY {value} {dir})"),
            WindowKind::RowNumber => format!("ROW_NUMBER() OVER (ORDER BY {value} {dir})"),
            WindowKind::RunningTotal if order_keys.is_empty() => {
                format!("SUM({value}) OVER ()")
            }
            WindowKind::RunningTotal => format!(
                "SUM({value}) OVER (ORDER BY {} ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)",
                order_keys.join(", ")
            ),
            WindowKind::PercentOfTotal => {
                format!("{value} * 100.0 / NULLIF(SUM({value}) OVER (), 0)")
            }
        }
    }

    fn render_literal(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::Null => "NULL".to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            serde_json::Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(|v| self.render_literal(v)).collect();
                rendered.join(", ")
            }
            serde_json::Value::Object(_) => {
                format!("'{}'", value.to_string().replace('\'', "''"))
            }
        }
    }

    /// String literal for a LIKE pattern around `text`.
    fn render_like_pattern(&self, text: &str, leading: bool, trailing: bool) -> String {
        let escaped = text.replace('\'', "''");
        let lead = if leading { "%" } else { "" };
        let trail = if trailing { "%" } else { "" };
        format!("'{lead}{escaped}{trail}'")
    }
}
