use std::collections::{HashMap, HashSet, VecDeque};

use crate::dataset::{DatasetSchema, DatasetTable, RefType};
use crate::dialect::Dialect;
use crate::error::{QuerycraftError, Result};
use crate::models::Query;

/// How a table is reached from its parent on the join tree rooted at the
/// first table the query references.
#[derive(Debug, Clone)]
struct JoinEdge<'a> {
    parent: &'a str,
    ref_type: RefType,
    parent_columns: &'a [String],
    child_columns: &'a [String],
}

/// Build the FROM clause body (table list with joins) for a query.
pub fn build_from_clause(
    query: &Query,
    dataset: &DatasetSchema,
    dialect: &dyn Dialect,
) -> Result<String> {
    let required = query.table_ids();
    let root_id = *required.first().ok_or_else(|| {
        QuerycraftError::EmptyQuery("query references no tables".to_string())
    })?;
    let root = lookup_table(dataset, root_id)?;
    let mut from = dialect.alias_table(&dialect.qualify_table(root), &root.id);
    if required.len() == 1 {
        return Ok(from);
    }

    let parents = join_tree(dataset, root_id);
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(root_id);
    let mut ordered: Vec<&str> = Vec::new();
    for &id in &required[1..] {
        lookup_table(dataset, id)?;
        visit_table(id, &parents, &mut visited, &mut ordered)?;
    }

    for id in ordered {
        let table = lookup_table(dataset, id)?;
        let edge = &parents[id];
        if edge.parent_columns.len() != edge.child_columns.len() || edge.parent_columns.is_empty()
        {
            return Err(QuerycraftError::Relationship(format!(
                "relationship between {} and {} has mismatched join columns",
                edge.parent, id
            )));
        }
        let on: Vec<String> = edge
            .parent_columns
            .iter()
            .zip(edge.child_columns)
            .map(|(left, right)| format!("{}.{} = {}.{}", edge.parent, left, id, right))
            .collect();
        from.push_str(&format!(
            "\n\t{} {} ON {}",
            edge.ref_type.keyword(),
            dialect.alias_table(&dialect.qualify_table(table), &table.id),
            on.join(" AND ")
        ));
    }
    Ok(from)
}

fn lookup_table<'a>(dataset: &'a DatasetSchema, id: &str) -> Result<&'a DatasetTable> {
    dataset.table(id).ok_or_else(|| {
        QuerycraftError::Relationship(format!(
            "table {id} is not part of dataset {}",
            dataset.name
        ))
    })
}

/// Breadth-first search from the root; each reachable table records the
/// edge it was first reached by.
fn join_tree<'a>(dataset: &'a DatasetSchema, root: &'a str) -> HashMap<&'a str, JoinEdge<'a>> {
    let mut parents: HashMap<&str, JoinEdge> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    seen.insert(root);
    queue.push_back(root);

    while let Some(current) = queue.pop_front() {
        for rel in &dataset.relationships {
            let next = if rel.table1 == current {
                Some((
                    rel.table2.as_str(),
                    JoinEdge {
                        parent: current,
                        ref_type: rel.ref_type,
                        parent_columns: &rel.table1_columns,
                        child_columns: &rel.table2_columns,
                    },
                ))
            } else if rel.table2 == current {
                Some((
                    rel.table1.as_str(),
                    JoinEdge {
                        parent: current,
                        ref_type: rel.ref_type.reversed(),
                        parent_columns: &rel.table2_columns,
                        child_columns: &rel.table1_columns,
                    },
                ))
            } else {
                None
            };
            if let Some((child, edge)) = next {
                if seen.insert(child) {
                    parents.insert(child, edge);
                    queue.push_back(child);
                }
            }
        }
    }
    parents
}

/// Parents are emitted before children so every ON clause references joined tables.
fn visit_table<'a>(
    id: &'a str,
    parents: &HashMap<&'a str, JoinEdge<'a>>,
    visited: &mut HashSet<&'a str>,
    ordered: &mut Vec<&'a str>,
) -> Result<()> {
    if visited.contains(id) {
        return Ok(());
    }
    let edge = parents.get(id).ok_or_else(|| {
        QuerycraftError::Relationship(format!("no relationship path reaches table {id}"))
    })?;
    visit_table(edge.parent, parents, visited, ordered)?;
    visited.insert(id);
    ordered.push(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Relationship;
    use crate::dialect::Vendor;
    use crate::models::{Aggregation, DataType, Dimension, Measure};

    fn dataset() -> DatasetSchema {
        DatasetSchema {
            name: "retail".to_string(),
            tables: vec![
                DatasetTable::new("ord", "public", "orders"),
                DatasetTable::new("cust", "public", "customers"),
                DatasetTable::new("reg", "public", "regions"),
                DatasetTable::new("lonely", "public", "lonely"),
            ],
            relationships: vec![
                Relationship {
                    table1: "ord".to_string(),
                    table2: "cust".to_string(),
                    ref_type: RefType::Left,
                    cardinality: None,
                    table1_columns: vec!["customer_id".to_string()],
                    table2_columns: vec!["id".to_string()],
                },
                Relationship {
                    table1: "reg".to_string(),
                    table2: "cust".to_string(),
                    ref_type: RefType::Left,
                    cardinality: None,
                    table1_columns: vec!["id".to_string()],
                    table2_columns: vec!["region_id".to_string()],
                },
            ],
        }
    }

    #[test]
    fn single_table_from() {
        let query = Query {
            dimensions: vec![Dimension::new("ord", "status", DataType::Text)],
            ..Default::default()
        };
        let from = build_from_clause(&query, &dataset(), Vendor::Postgres.dialect()).unwrap();
        assert_eq!(from, "public.orders AS ord");
    }

    #[test]
    fn joins_through_intermediate_table() {
        let query = Query {
            dimensions: vec![Dimension::new("reg", "name", DataType::Text)],
            measures: vec![Measure::new("ord", "amount", Aggregation::Sum)],
            ..Default::default()
        };
        let from = build_from_clause(&query, &dataset(), Vendor::Postgres.dialect()).unwrap();
        assert_eq!(
            from,
            "public.regions AS reg\n\tLEFT JOIN public.customers AS cust ON reg.id = cust.region_id\n\tRIGHT JOIN public.orders AS ord ON cust.id = ord.customer_id"
        );
    }

    #[test]
    fn disconnected_table_is_an_error() {
        let query = Query {
            dimensions: vec![Dimension::new("ord", "status", DataType::Text)],
            measures: vec![Measure::new("lonely", "x", Aggregation::Sum)],
            ..Default::default()
        };
        let err = build_from_clause(&query, &dataset(), Vendor::Postgres.dialect()).unwrap_err();
        assert!(matches!(err, QuerycraftError::Relationship(_)));
    }

    #[test]
    fn unknown_table_is_an_error() {
        let query = Query {
            dimensions: vec![Dimension::new("nope", "status", DataType::Text)],
            ..Default::default()
        };
        let err = build_from_clause(&query, &dataset(), Vendor::Postgres.dialect()).unwrap_err();
        assert!(matches!(err, QuerycraftError::Relationship(_)));
    }
}
