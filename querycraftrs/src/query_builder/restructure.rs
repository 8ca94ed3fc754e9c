//! Two-level statements for dialects that hoist window functions.
//!
//! BigQuery cannot order a grouped select by a month or weekday extraction
//! it does not project, and cannot mix windowed aggregates with GROUP BY in
//! one projection. Both are solved by grouping in a derived table and
//! re-projecting by alias one level up.

use crate::error::Result;
use crate::fragments::{ClauseFragmentMap, FragmentRole, SelectFragment};
use crate::models::{DataType, Query, TimeGrain};

use super::plan::{QueryPlan, SelectStatement, WrappedPlan};

/// A date or timestamp dimension grouped by month name or weekday name.
pub(crate) fn has_named_time_grain(query: &Query) -> bool {
    query.dimensions.iter().any(|dim| {
        matches!(dim.data_type, DataType::Date | DataType::Timestamp)
            && matches!(dim.time_grain, Some(TimeGrain::Month | TimeGrain::DayOfWeek))
    })
}

/// Pick the statement shape for a hoisting dialect.
pub(crate) fn restructure(
    query: &Query,
    fragments: &ClauseFragmentMap,
    from: String,
    filter: String,
) -> Result<QueryPlan> {
    let has_dimensions = !query.dimensions.is_empty();
    let time_grain = has_named_time_grain(query);

    if fragments.has_role(FragmentRole::WindowFunction) {
        let kept: Vec<&SelectFragment> = fragments
            .select
            .iter()
            .filter(|f| !f.is(FragmentRole::WindowFunction))
            .filter(|f| !(time_grain && f.is(FragmentRole::SortKey)))
            .collect();

        let mut projection = Vec::new();
        for fragment in kept.iter().filter(|f| !f.is(FragmentRole::MeasureInput)) {
            projection.push(fragment.require_alias()?.to_string());
        }
        projection.extend(
            fragments
                .select
                .iter()
                .filter(|f| f.is(FragmentRole::WindowFunction))
                .map(SelectFragment::render),
        );

        let (group_by, order_by) = if has_dimensions {
            (fragments.distinct_group_by(), fragments.distinct_order_by())
        } else {
            (Vec::new(), Vec::new())
        };
        let inner = SelectStatement {
            select: kept.iter().map(|f| f.render()).collect(),
            from,
            joins: Vec::new(),
            filter,
            group_by,
            order_by: Vec::new(),
        };
        tracing::debug!(columns = projection.len(), "hoisting window functions out of grouped select");
        return Ok(QueryPlan::Wrapped(WrappedPlan {
            projection,
            inner,
            order_by,
        }));
    }

    if time_grain {
        let mut projection = Vec::new();
        for fragment in fragments.select.iter().filter(|f| !f.is(FragmentRole::SortKey)) {
            projection.push(fragment.require_alias()?.to_string());
        }
        let inner = SelectStatement::assemble(fragments, from, filter, has_dimensions);
        tracing::debug!(columns = projection.len(), "wrapping select to drop sort keys");
        return Ok(QueryPlan::Wrapped(WrappedPlan {
            projection,
            inner,
            order_by: Vec::new(),
        }));
    }

    Ok(QueryPlan::Flat(SelectStatement::assemble(
        fragments,
        from,
        filter,
        has_dimensions,
    )))
}
