//! Rollup chains: every query after the base becomes a derived table, is
//! rolled up one dimension at a time, and is joined back onto the base on the
//! dimensions both share.

use std::slice;

use crate::dataset::DatasetSchema;
use crate::dialect::{Dialect, MySqlDialect, Vendor};
use crate::error::{QuerycraftError, Result};
use crate::models::{Dimension, Query};

use super::compose_plan;
use super::plan::{ChainPlan, DerivedTable, SelectStatement};
use super::select::{build_select_clause, dimension_expr};

/// First derived table number; the base query is implicitly table one.
const FIRST_DERIVED_TABLE: usize = 2;

/// How a chain member's dimensions relate to the base query.
#[derive(Debug, Clone, Default)]
pub(crate) struct DimensionSplit {
    /// Dimensions up to and including the rollup boundary, closest to the root first.
    pub override_dims: Vec<Dimension>,
    /// Dimensions rolled away level by level.
    pub leftover: Vec<Dimension>,
    /// Override dimensions the base also selects, in base order.
    pub common: Vec<Dimension>,
    /// Common dimensions followed by leftover dimensions.
    pub combined: Vec<Dimension>,
}

pub(crate) fn split_dimensions(base: &[Dimension], member: &[Dimension]) -> DimensionSplit {
    let mut override_dims: Vec<Dimension> = Vec::new();
    let mut leftover: Vec<Dimension> = Vec::new();
    let mut boundary_seen = false;
    for dim in member {
        if dim.rollup_depth {
            boundary_seen = true;
            override_dims.push(dim.clone());
        } else if boundary_seen {
            leftover.push(dim.clone());
        } else {
            override_dims.insert(0, dim.clone());
        }
    }

    for dim in &override_dims {
        if !base.iter().any(|b| b.same_field(dim)) {
            leftover.insert(0, dim.clone());
        }
    }

    let common: Vec<Dimension> = base
        .iter()
        .filter_map(|b| override_dims.iter().find(|o| o.same_field(b)))
        .cloned()
        .collect();

    let mut combined = common.clone();
    combined.extend(leftover.iter().cloned());

    DimensionSplit {
        override_dims,
        leftover,
        common,
        combined,
    }
}

/// Append each member's derived tables and join clause to the base chain.
pub(crate) fn attach_members(
    chain: &mut ChainPlan,
    base: &Query,
    members: &[Query],
    dataset: &DatasetSchema,
    vendor: Vendor,
) -> Result<()> {
    let mut table_number = FIRST_DERIVED_TABLE;
    let rollup_dialect = MySqlDialect::mysql();

    for (index, member) in members.iter().enumerate() {
        let split = split_dimensions(&base.dimensions, &member.dimensions);
        let measure = member.measures.first().ok_or_else(|| {
            QuerycraftError::MalformedRollupChain(format!(
                "chain member {} has no measure to roll up",
                index + 1
            ))
        })?;

        resolve_member_tables(member, dataset, index)?;
        let mut member_plan = compose_plan(slice::from_ref(member), dataset, vendor)?.body;
        member_plan.clear_ordering();
        let member_sql = member_plan.render();
        let mut current = format!("tbl{table_number}");
        table_number += 1;
        chain.derived.push(DerivedTable {
            name: current.clone(),
            sql: member_sql,
        });

        let mut working = split.combined.clone();
        for _ in &split.leftover {
            working.pop().ok_or_else(|| {
                QuerycraftError::MalformedRollupChain(format!(
                    "chain member {} ran out of dimensions to roll up",
                    index + 1
                ))
            })?;
            let level = Query {
                dimensions: working.iter().map(|d| d.rolled_into(&current)).collect(),
                measures: vec![measure.rolled_into(&current)],
                filter_panels: Vec::new(),
            };
            let fragments = build_select_clause(&rollup_dialect, &level)?;
            let statement = SelectStatement {
                select: fragments.rendered_select(),
                from: current.clone(),
                group_by: fragments.distinct_group_by(),
                ..Default::default()
            };
            let name = format!("tbl{table_number}");
            table_number += 1;
            chain.derived.push(DerivedTable {
                name: name.clone(),
                sql: statement.render(),
            });
            working = level.dimensions;
            current = name;
        }

        let join = if working.is_empty() {
            format!("\tCROSS JOIN {current}")
        } else {
            let predicates = join_predicates(&split.common, base, vendor.dialect(), &current)?;
            format!("\tLEFT JOIN {current} ON {}", predicates.join(" AND "))
        };
        tracing::debug!(
            member = index + 1,
            overrides = split.override_dims.len(),
            common = split.common.len(),
            leftover = split.leftover.len(),
            table = %current,
            "rolled up chain member"
        );
        chain.body.source_mut().joins.push(join);
    }
    Ok(())
}

/// Every table a chain member references must belong to the dataset.
fn resolve_member_tables(member: &Query, dataset: &DatasetSchema, index: usize) -> Result<()> {
    match member.table_ids().into_iter().find(|id| dataset.table(id).is_none()) {
        Some(id) => Err(QuerycraftError::MalformedRollupChain(format!(
            "chain member {} references unknown table {id}",
            index + 1
        ))),
        None => Ok(()),
    }
}

/// `<base expression> = <table>.<alias>` for every shared dimension.
fn join_predicates(
    common: &[Dimension],
    base: &Query,
    dialect: &dyn Dialect,
    table: &str,
) -> Result<Vec<String>> {
    let mut predicates = Vec::with_capacity(common.len());
    for member_dim in common {
        let base_dim = base
            .dimensions
            .iter()
            .find(|d| d.same_field(member_dim))
            .ok_or_else(|| {
                QuerycraftError::MalformedRollupChain(format!(
                    "dimension {}.{} is not selected by the base query",
                    member_dim.table_id, member_dim.field_name
                ))
            })?;
        let base_expr = dimension_expr(dialect, base_dim).value;
        predicates.push(format!("{base_expr} = {table}.{}", member_dim.output_alias()));
    }
    Ok(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetTable;
    use crate::models::{Aggregation, DataType, Measure};

    fn dim(field: &str) -> Dimension {
        Dimension::new("pos", field, DataType::Text)
    }

    fn dataset() -> DatasetSchema {
        DatasetSchema {
            name: "retail".to_string(),
            tables: vec![DatasetTable::new("pos", "retail", "point_of_sales")],
            relationships: Vec::new(),
        }
    }

    fn query(dimensions: Vec<Dimension>) -> Query {
        Query {
            dimensions,
            measures: vec![Measure::new("pos", "sales", Aggregation::Sum)],
            filter_panels: Vec::new(),
        }
    }

    fn fields(dims: &[Dimension]) -> Vec<&str> {
        dims.iter().map(|d| d.field_name.as_str()).collect()
    }

    fn chain_for(base: Query, member: Query) -> ChainPlan {
        compose_plan(&[base, member], &dataset(), Vendor::MySql).unwrap()
    }

    #[test]
    fn split_before_and_after_boundary() {
        let base = vec![dim("region"), dim("category")];
        let member = vec![
            dim("region"),
            dim("category").with_rollup_depth(),
            dim("product"),
        ];
        let split = split_dimensions(&base, &member);
        assert_eq!(fields(&split.override_dims), vec!["region", "category"]);
        assert_eq!(fields(&split.leftover), vec!["product"]);
        assert_eq!(fields(&split.common), vec!["region", "category"]);
        assert_eq!(fields(&split.combined), vec!["region", "category", "product"]);
    }

    #[test]
    fn override_dimension_missing_from_base_is_leftover() {
        let base = vec![dim("region")];
        let member = vec![dim("country"), dim("region").with_rollup_depth(), dim("city")];
        let split = split_dimensions(&base, &member);
        assert_eq!(fields(&split.override_dims), vec!["country", "region"]);
        assert_eq!(fields(&split.leftover), vec!["country", "city"]);
        assert_eq!(fields(&split.common), vec!["region"]);
        assert_eq!(fields(&split.combined), vec!["region", "country", "city"]);
    }

    #[test]
    fn grain_distinguishes_dimensions() {
        let date = Dimension::new("pos", "order_date", DataType::Date);
        let base = vec![date.clone().with_grain(crate::models::TimeGrain::Year)];
        let member = vec![date.with_grain(crate::models::TimeGrain::Month).with_rollup_depth()];
        let split = split_dimensions(&base, &member);
        assert!(split.common.is_empty());
        assert_eq!(split.leftover.len(), 1);
    }

    #[test]
    fn shared_dimensions_left_join_rolled_level() {
        let base = query(vec![dim("region"), dim("category")]);
        let member = query(vec![
            dim("region"),
            dim("category").with_rollup_depth(),
            dim("product"),
        ]);
        let chain = chain_for(base, member);
        let names: Vec<&str> = chain.derived.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["tbl2", "tbl3"]);
        assert_eq!(
            chain.derived[1].sql,
            "SELECT\n\ttbl2.region AS region,\n\ttbl2.category AS category,\n\tSUM(tbl2.sum__sales) AS sum__sales\nFROM tbl2\nGROUP BY\n\ttbl2.region,\n\ttbl2.category"
        );
        let sql = chain.render();
        assert!(sql.contains("LEFT JOIN tbl3 ON pos.region = tbl3.region AND pos.category = tbl3.category"));
        assert!(!sql.contains("CROSS JOIN"));
    }

    #[test]
    fn nothing_shared_cross_joins() {
        let base = query(vec![dim("region")]);
        let member = query(vec![dim("product").with_rollup_depth()]);
        let chain = chain_for(base, member);
        assert_eq!(
            chain.derived[1].sql,
            "SELECT\n\tSUM(tbl2.sum__sales) AS sum__sales\nFROM tbl2"
        );
        let sql = chain.render();
        assert!(sql.contains("\tCROSS JOIN tbl3"));
        assert!(!sql.contains("LEFT JOIN tbl"));
    }

    #[test]
    fn count_measures_roll_up_as_sums() {
        let base = query(vec![dim("region")]);
        let mut member = query(vec![dim("region"), dim("product").with_rollup_depth()]);
        member.measures = vec![Measure::new("pos", "order_id", Aggregation::CountUnique)];
        let chain = chain_for(base, member);
        assert!(chain.derived[1]
            .sql
            .contains("SUM(tbl2.countu__order_id) AS countu__order_id"));
    }

    #[test]
    fn table_numbers_continue_across_members() {
        let base = query(vec![dim("region")]);
        let first = query(vec![dim("region"), dim("product").with_rollup_depth()]);
        let second = query(vec![dim("region").with_rollup_depth()]);
        let chain = compose_plan(&[base, first, second], &dataset(), Vendor::MySql).unwrap();
        let names: Vec<&str> = chain.derived.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["tbl2", "tbl3", "tbl4"]);
        let sql = chain.render();
        assert!(sql.contains("LEFT JOIN tbl3 ON pos.region = tbl3.region"));
        assert!(sql.contains("LEFT JOIN tbl4 ON pos.region = tbl4.region"));
    }

    #[test]
    fn member_without_measure_is_malformed() {
        let base = query(vec![dim("region")]);
        let mut member = query(vec![dim("region")]);
        member.measures.clear();
        let err = compose_plan(&[base, member], &dataset(), Vendor::MySql).unwrap_err();
        assert!(matches!(err, QuerycraftError::MalformedRollupChain(_)));
    }

    #[test]
    fn member_with_unknown_table_is_malformed() {
        let base = query(vec![dim("region")]);
        let mut member = query(vec![dim("region").with_rollup_depth()]);
        member.measures = vec![Measure::new("ghost", "sales", Aggregation::Sum)];
        let err = compose_plan(&[base, member], &dataset(), Vendor::MySql).unwrap_err();
        match err {
            QuerycraftError::MalformedRollupChain(message) => assert!(message.contains("ghost")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn second_level_reads_from_first_level() {
        let base = query(vec![dim("region")]);
        let member = query(vec![
            dim("region").with_rollup_depth(),
            dim("category"),
            dim("product"),
        ]);
        let chain = chain_for(base, member);
        let names: Vec<&str> = chain.derived.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["tbl2", "tbl3", "tbl4"]);
        assert_eq!(
            chain.derived[1].sql,
            "SELECT\n\ttbl2.region AS region,\n\ttbl2.category AS category,\n\tSUM(tbl2.sum__sales) AS sum__sales\nFROM tbl2\nGROUP BY\n\ttbl2.region,\n\ttbl2.category"
        );
        assert_eq!(
            chain.derived[2].sql,
            "SELECT\n\ttbl3.region AS region,\n\tSUM(tbl3.sum__sales) AS sum__sales\nFROM tbl3\nGROUP BY\n\ttbl3.region"
        );
        let sql = chain.render();
        assert!(sql.contains("\tLEFT JOIN tbl4 ON pos.region = tbl4.region\n"));
        assert!(!sql.contains("JOIN tbl2"));
        assert!(!sql.contains("JOIN tbl3"));
    }

    #[test]
    fn member_body_drops_ordering() {
        let base = query(vec![dim("region")]);
        let member = query(vec![dim("region").with_rollup_depth()]);
        let chain = chain_for(base, member);
        assert!(!chain.derived[0].sql.contains("ORDER BY"));
        assert!(chain.render().ends_with("ORDER BY\n\tpos.region"));
    }
}
