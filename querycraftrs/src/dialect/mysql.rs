//! MySQL-family dialect. DuckDB shares the builder with its own function names.

use crate::dataset::DatasetTable;
use crate::models::{DataType, TimeGrain};

use super::{Dialect, GrainExpr};

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect {
    duckdb: bool,
}

pub(super) static MYSQL: MySqlDialect = MySqlDialect { duckdb: false };
pub(super) static DUCKDB: MySqlDialect = MySqlDialect { duckdb: true };

impl MySqlDialect {
    pub fn mysql() -> Self {
        MYSQL
    }

    pub fn duckdb() -> Self {
        DUCKDB
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        if self.duckdb {
            "duckdb"
        } else {
            "mysql"
        }
    }

    fn qualify_table(&self, table: &DatasetTable) -> String {
        if self.duckdb {
            let parts: Vec<&str> = [table.database.as_deref(), table.schema.as_deref()]
                .into_iter()
                .flatten()
                .filter(|p| !p.is_empty())
                .chain(std::iter::once(table.table.as_str()))
                .collect();
            return parts.join(".");
        }
        // MySQL has no schema layer; the schema field names the database.
        match table.schema.as_deref().or(table.database.as_deref()) {
            Some(db) if !db.is_empty() => format!("{db}.{}", table.table),
            _ => table.table.clone(),
        }
    }

    fn grain_expr(&self, col: &str, _data_type: DataType, grain: TimeGrain) -> GrainExpr {
        if self.duckdb {
            return duckdb_grain(col, grain);
        }
        match grain {
            TimeGrain::Year => GrainExpr::value(format!("YEAR({col})")),
            TimeGrain::Quarter => GrainExpr::value(format!("CONCAT('Q', QUARTER({col}))")),
            TimeGrain::Month => {
                GrainExpr::sorted_by(format!("MONTHNAME({col})"), format!("MONTH({col})"))
            }
            TimeGrain::YearQuarter => {
                GrainExpr::value(format!("CONCAT(YEAR({col}), '-Q', QUARTER({col}))"))
            }
            TimeGrain::YearMonth => GrainExpr::value(format!("DATE_FORMAT({col}, '%Y-%m')")),
            TimeGrain::Date => GrainExpr::value(format!("DATE({col})")),
            TimeGrain::DayOfWeek => {
                GrainExpr::sorted_by(format!("DAYNAME({col})"), format!("DAYOFWEEK({col})"))
            }
            TimeGrain::DayOfMonth => GrainExpr::value(format!("DAY({col})")),
        }
    }
}

fn duckdb_grain(col: &str, grain: TimeGrain) -> GrainExpr {
    match grain {
        TimeGrain::Year => GrainExpr::value(format!("year({col})")),
        TimeGrain::Quarter => GrainExpr::value(format!("concat('Q', quarter({col}))")),
        TimeGrain::Month => {
            GrainExpr::sorted_by(format!("monthname({col})"), format!("month({col})"))
        }
        TimeGrain::YearQuarter => {
            GrainExpr::value(format!("concat(year({col}), '-Q', quarter({col}))"))
        }
        TimeGrain::YearMonth => GrainExpr::value(format!("strftime({col}, '%Y-%m')")),
        TimeGrain::Date => GrainExpr::value(format!("CAST({col} AS DATE)")),
        TimeGrain::DayOfWeek => GrainExpr::sorted_by(
            format!("dayname({col})"),
            format!("dayofweek({col}) + 1"),
        ),
        TimeGrain::DayOfMonth => GrainExpr::value(format!("day({col})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_and_duckdb_differ_in_function_names() {
        let mysql = MySqlDialect::mysql().grain_expr("t.d", DataType::Date, TimeGrain::YearMonth);
        let duck = MySqlDialect::duckdb().grain_expr("t.d", DataType::Date, TimeGrain::YearMonth);
        assert_eq!(mysql.value, "DATE_FORMAT(t.d, '%Y-%m')");
        assert_eq!(duck.value, "strftime(t.d, '%Y-%m')");
    }

    #[test]
    fn mysql_qualifies_with_database() {
        let table = DatasetTable::new("pos", "sales_db", "orders");
        assert_eq!(MySqlDialect::mysql().qualify_table(&table), "sales_db.orders");
    }
}
