use std::slice;

use crate::config::ComposeConfig;
use crate::dataset::DatasetSchema;
use crate::dialect::Vendor;
use crate::error::{QuerycraftError, Result};
use crate::models::Query;

mod filters;
mod plan;
mod relationships;
mod restructure;
mod rollup;
mod select;

pub use filters::build_where_clause;
pub use plan::{ChainPlan, DerivedTable, QueryPlan, SelectStatement, WrappedPlan, WRAPPED_ALIAS};
pub use relationships::build_from_clause;
pub use select::build_select_clause;

/// Turns logical queries into SQL text for one vendor.
#[derive(Debug, Clone, Default)]
pub struct QueryComposer {
    config: ComposeConfig,
}

impl QueryComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ComposeConfig) -> Self {
        Self { config }
    }

    /// Compose SQL for `queries`. The first query is the base; any further
    /// queries are rolled up into derived tables joined onto it.
    pub fn compose(
        &self,
        queries: &[Query],
        dataset: &DatasetSchema,
        vendor_name: &str,
    ) -> Result<String> {
        let vendor: Vendor = vendor_name.parse()?;
        let sql = self.plan(queries, dataset, vendor)?.render();
        if self.config.log_sql {
            tracing::trace!(vendor = %vendor, sql = %sql, "composed sql");
        }
        Ok(sql)
    }

    /// Statement structure for `queries`, before rendering.
    pub fn plan(
        &self,
        queries: &[Query],
        dataset: &DatasetSchema,
        vendor: Vendor,
    ) -> Result<ChainPlan> {
        let limit = self.config.max_chain_length;
        if limit > 0 && queries.len() > limit {
            return Err(QuerycraftError::MalformedRollupChain(format!(
                "chain of {} queries exceeds the configured maximum of {limit}",
                queries.len()
            )));
        }
        tracing::debug!(
            vendor = %vendor,
            dataset = %dataset.name,
            queries = queries.len(),
            "composing query"
        );
        compose_plan(queries, dataset, vendor)
    }
}

/// Compose with default settings.
pub fn compose(queries: &[Query], dataset: &DatasetSchema, vendor_name: &str) -> Result<String> {
    QueryComposer::default().compose(queries, dataset, vendor_name)
}

/// A single query is the base case; longer lists recurse into it for the
/// base and for every chain member.
pub(crate) fn compose_plan(
    queries: &[Query],
    dataset: &DatasetSchema,
    vendor: Vendor,
) -> Result<ChainPlan> {
    match queries {
        [] => Err(QuerycraftError::EmptyQuery(
            "no queries to compose".to_string(),
        )),
        [query] => Ok(ChainPlan {
            derived: Vec::new(),
            body: compose_single(query, dataset, vendor)?,
        }),
        [base, members @ ..] => {
            let mut chain = compose_plan(slice::from_ref(base), dataset, vendor)?;
            rollup::attach_members(&mut chain, base, members, dataset, vendor)?;
            Ok(chain)
        }
    }
}

fn compose_single(query: &Query, dataset: &DatasetSchema, vendor: Vendor) -> Result<QueryPlan> {
    if query.dimensions.is_empty() && query.measures.is_empty() {
        return Err(QuerycraftError::EmptyQuery(
            "query has neither dimensions nor measures".to_string(),
        ));
    }
    let dialect = vendor.dialect();
    let from = build_from_clause(query, dataset, dialect)?;
    let fragments = build_select_clause(dialect, query)?;
    let filter = build_where_clause(&query.filter_panels, dialect)?;

    if dialect.hoists_window_functions() {
        restructure::restructure(query, &fragments, from, filter)
    } else {
        Ok(QueryPlan::Flat(SelectStatement::assemble(
            &fragments,
            from,
            filter,
            !query.dimensions.is_empty(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetTable;
    use crate::models::{Aggregation, DataType, Dimension, Measure};

    fn dataset() -> DatasetSchema {
        DatasetSchema {
            name: "retail".to_string(),
            tables: vec![DatasetTable::new("pos", "retail", "point_of_sales")],
            relationships: Vec::new(),
        }
    }

    fn region_sales() -> Query {
        Query {
            dimensions: vec![Dimension::new("pos", "region", DataType::Text)],
            measures: vec![Measure::new("pos", "sales", Aggregation::Sum)],
            filter_panels: Vec::new(),
        }
    }

    #[test]
    fn single_query_has_no_derived_tables() {
        let chain = QueryComposer::new()
            .plan(&[region_sales()], &dataset(), Vendor::MySql)
            .unwrap();
        assert!(chain.derived.is_empty());
        assert!(matches!(chain.body, QueryPlan::Flat(_)));
    }

    #[test]
    fn vendor_is_checked_before_queries() {
        let err = compose(&[], &dataset(), "Oracle").unwrap_err();
        assert!(matches!(err, QuerycraftError::UnsupportedVendor(_)));
        let err = compose(&[], &dataset(), "oracle").unwrap_err();
        assert!(matches!(err, QuerycraftError::EmptyQuery(_)));
    }

    #[test]
    fn query_without_fields_is_empty() {
        let err = compose(&[Query::default()], &dataset(), "mysql").unwrap_err();
        assert!(matches!(err, QuerycraftError::EmptyQuery(_)));
    }

    #[test]
    fn chain_length_limit() {
        let composer = QueryComposer::with_config(ComposeConfig {
            max_chain_length: 2,
            log_sql: false,
        });
        let queries = vec![region_sales(), region_sales(), region_sales()];
        let err = composer.compose(&queries, &dataset(), "mysql").unwrap_err();
        assert!(matches!(err, QuerycraftError::MalformedRollupChain(_)));
        assert!(composer.compose(&queries[..2], &dataset(), "mysql").is_ok());
    }
}
