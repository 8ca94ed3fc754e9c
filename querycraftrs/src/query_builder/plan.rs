//! Composed query intermediate representation.
//!
//! The composer decides the statement shape (flat, wrapped in a derived
//! table, or prefixed by a chain of derived tables) before any text is
//! concatenated. Rendering happens once, at the end.

use crate::fragments::ClauseFragmentMap;

/// Alias of the derived table a restructured statement selects from.
pub const WRAPPED_ALIAS: &str = "Tbl";

/// A single SELECT statement, clause by clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectStatement {
    pub select: Vec<String>,
    pub from: String,
    /// Extra join clauses appended after the FROM body.
    pub joins: Vec<String>,
    /// WHERE body; empty when nothing filters.
    pub filter: String,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
}

impl SelectStatement {
    /// Standard clause assembly. Grouping and ordering only apply when the
    /// query has dimensions; a measures-only query is a plain aggregate.
    pub fn assemble(
        fragments: &ClauseFragmentMap,
        from: String,
        filter: String,
        has_dimensions: bool,
    ) -> Self {
        let (group_by, order_by) = if has_dimensions {
            (fragments.distinct_group_by(), fragments.distinct_order_by())
        } else {
            (Vec::new(), Vec::new())
        };
        Self {
            select: fragments.rendered_select(),
            from,
            joins: Vec::new(),
            filter,
            group_by,
            order_by,
        }
    }

    pub fn render(&self) -> String {
        let mut sql = format!("SELECT\n\t{}\nFROM {}", self.select.join(",\n\t"), self.from);
        for join in &self.joins {
            sql.push('\n');
            sql.push_str(join);
        }
        if !self.filter.is_empty() {
            sql.push_str(&format!("\nWHERE {}", self.filter));
        }
        if !self.group_by.is_empty() {
            sql.push_str(&format!("\nGROUP BY\n\t{}", self.group_by.join(",\n\t")));
        }
        if !self.order_by.is_empty() {
            sql.push_str(&format!("\nORDER BY\n\t{}", self.order_by.join(",\n\t")));
        }
        sql
    }
}

/// Outer projection over a grouped sub-select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedPlan {
    pub projection: Vec<String>,
    pub inner: SelectStatement,
    pub order_by: Vec<String>,
}

impl WrappedPlan {
    pub fn render(&self) -> String {
        let mut sql = format!(
            "SELECT\n\t{}\nFROM (\n{}\n) AS {WRAPPED_ALIAS}",
            self.projection.join(",\n\t"),
            self.inner.render()
        );
        if !self.order_by.is_empty() {
            sql.push_str(&format!("\nORDER BY\n\t{}", self.order_by.join(",\n\t")));
        }
        sql
    }
}

/// Shape of one composed logical query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    Flat(SelectStatement),
    Wrapped(WrappedPlan),
}

impl QueryPlan {
    /// The statement that owns the FROM clause.
    pub fn source_mut(&mut self) -> &mut SelectStatement {
        match self {
            QueryPlan::Flat(statement) => statement,
            QueryPlan::Wrapped(wrapped) => &mut wrapped.inner,
        }
    }

    /// Drop every ORDER BY, inner and outer, so the plan can sit inside a
    /// derived table.
    pub fn clear_ordering(&mut self) {
        match self {
            QueryPlan::Flat(statement) => statement.order_by.clear(),
            QueryPlan::Wrapped(wrapped) => {
                wrapped.inner.order_by.clear();
                wrapped.order_by.clear();
            }
        }
    }

    pub fn render(&self) -> String {
        match self {
            QueryPlan::Flat(statement) => statement.render(),
            QueryPlan::Wrapped(wrapped) => wrapped.render(),
        }
    }
}

/// Named sub-query in the chain of a rollup composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTable {
    pub name: String,
    pub sql: String,
}

/// Base query plus the derived tables its joins refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPlan {
    pub derived: Vec<DerivedTable>,
    pub body: QueryPlan,
}

impl ChainPlan {
    pub fn render(&self) -> String {
        if self.derived.is_empty() {
            return self.body.render();
        }
        let tables: Vec<String> = self
            .derived
            .iter()
            .map(|t| format!("{} AS (\n{}\n)", t.name, t.sql))
            .collect();
        format!("WITH {}\n{}", tables.join(",\n"), self.body.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::SelectFragment;

    fn fragments() -> ClauseFragmentMap {
        ClauseFragmentMap {
            select: vec![
                SelectFragment::plain("t.region", "region"),
                SelectFragment::plain("SUM(t.sales)", "sum__sales"),
            ],
            group_by: vec!["t.region".to_string(), "t.region".to_string()],
            order_by: vec!["t.region".to_string(), "t.region".to_string()],
        }
    }

    #[test]
    fn grouped_statement_dedups_and_renders_every_clause() {
        let statement =
            SelectStatement::assemble(&fragments(), "s.t AS t".to_string(), "t.x = 1".to_string(), true);
        assert_eq!(
            statement.render(),
            "SELECT\n\tt.region AS region,\n\tSUM(t.sales) AS sum__sales\nFROM s.t AS t\nWHERE t.x = 1\nGROUP BY\n\tt.region\nORDER BY\n\tt.region"
        );
    }

    #[test]
    fn aggregate_only_statement_has_no_grouping() {
        let statement =
            SelectStatement::assemble(&fragments(), "s.t AS t".to_string(), String::new(), false);
        let sql = statement.render();
        assert!(!sql.contains("GROUP BY"));
        assert!(!sql.contains("ORDER BY"));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn wrapped_plan_joins_attach_to_inner_statement() {
        let mut plan = QueryPlan::Wrapped(WrappedPlan {
            projection: vec!["region".to_string()],
            inner: SelectStatement::assemble(&fragments(), "s.t AS t".to_string(), String::new(), true),
            order_by: Vec::new(),
        });
        plan.source_mut().joins.push("CROSS JOIN tbl2".to_string());
        let sql = plan.render();
        assert!(sql.starts_with("SELECT\n\tregion\nFROM (\nSELECT"));
        assert!(sql.contains("FROM s.t AS t\nCROSS JOIN tbl2\nGROUP BY"));
        assert!(sql.ends_with(") AS Tbl"));
    }

    #[test]
    fn clearing_ordering_reaches_both_levels() {
        let mut flat = QueryPlan::Flat(SelectStatement::assemble(
            &fragments(),
            "s.t AS t".to_string(),
            String::new(),
            true,
        ));
        flat.clear_ordering();
        let sql = flat.render();
        assert!(!sql.contains("ORDER BY"));
        assert!(sql.ends_with("GROUP BY\n\tt.region"));

        let mut wrapped = QueryPlan::Wrapped(WrappedPlan {
            projection: vec!["region".to_string()],
            inner: SelectStatement::assemble(&fragments(), "s.t AS t".to_string(), String::new(), true),
            order_by: vec!["region".to_string()],
        });
        wrapped.clear_ordering();
        let sql = wrapped.render();
        assert!(!sql.contains("ORDER BY"));
        assert!(sql.ends_with(") AS Tbl"));
    }

    #[test]
    fn chain_prefixes_derived_tables() {
        let chain = ChainPlan {
            derived: vec![
                DerivedTable {
                    name: "tbl2".to_string(),
                    sql: "SELECT 1".to_string(),
                },
                DerivedTable {
                    name: "tbl3".to_string(),
                    sql: "SELECT 2".to_string(),
                },
            ],
            body: QueryPlan::Flat(SelectStatement {
                select: vec!["x".to_string()],
                from: "t".to_string(),
                ..Default::default()
            }),
        };
        assert_eq!(
            chain.render(),
            "WITH tbl2 AS (\nSELECT 1\n),\ntbl3 AS (\nSELECT 2\n)\nSELECT\n\tx\nFROM t"
        );
    }
}
