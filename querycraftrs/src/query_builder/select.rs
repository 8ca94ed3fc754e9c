//! Select-clause walker shared by every dialect.
//!
//! Turns a logical query into a [`ClauseFragmentMap`]; the dialect supplies
//! the vendor-specific pieces.

use crate::dialect::{Dialect, GrainExpr};
use crate::error::{QuerycraftError, Result};
use crate::fragments::{ClauseFragmentMap, FragmentRole, SelectFragment};
use crate::models::{Dimension, Measure, Query};

/// Build the select, group-by and order-by fragments for one query.
pub fn build_select_clause(dialect: &dyn Dialect, query: &Query) -> Result<ClauseFragmentMap> {
    let mut map = ClauseFragmentMap::default();

    // Window ordering needs the dimension keys in both shapes. Hoisted windows
    // only see the sub-select's output columns, so they order by alias.
    let mut dimension_exprs: Vec<String> = Vec::new();
    let mut dimension_aliases: Vec<String> = Vec::new();

    for dim in &query.dimensions {
        let grain = dimension_expr(dialect, dim);
        let alias = dim.output_alias();

        map.select
            .push(SelectFragment::plain(grain.value.clone(), alias.clone()));
        map.group_by.push(grain.value.clone());
        dimension_aliases.push(alias.clone());
        match grain.sort_key {
            Some(sort_key) => {
                if dialect.selects_sort_keys() {
                    map.select.push(SelectFragment::new(
                        sort_key.clone(),
                        format!("{alias}_sort"),
                        FragmentRole::SortKey,
                    ));
                }
                map.group_by.push(sort_key.clone());
                map.order_by.push(sort_key.clone());
                dimension_exprs.push(sort_key);
            }
            None => {
                map.order_by.push(grain.value.clone());
                dimension_exprs.push(grain.value);
            }
        }
    }

    for measure in &query.measures {
        let aggregate = measure_expr(dialect, measure);
        let alias = measure.output_alias();
        match &measure.window_fn {
            None => map.select.push(SelectFragment::plain(aggregate, alias)),
            Some(window) if dialect.hoists_window_functions() => {
                // The aggregate is computed in the grouped sub-select and the
                // window runs over its alias one level up.
                let input_alias = format!("{alias}_value");
                let window_expr = dialect.render_window(window, &input_alias, &dimension_aliases);
                map.select.push(SelectFragment::new(
                    aggregate,
                    input_alias,
                    FragmentRole::MeasureInput,
                ));
                map.select.push(SelectFragment::new(
                    window_expr,
                    alias,
                    FragmentRole::WindowFunction,
                ));
            }
            Some(window) => {
                let window_expr = dialect.render_window(window, &aggregate, &dimension_exprs);
                map.select.push(SelectFragment::new(
                    window_expr,
                    alias,
                    FragmentRole::WindowFunction,
                ));
            }
        }
    }

    if map.select.is_empty() {
        return Err(QuerycraftError::EmptyQuery(
            "query selects no dimensions or measures".to_string(),
        ));
    }
    Ok(map)
}

pub(crate) fn column_ref(table_id: &str, field_name: &str) -> String {
    format!("{table_id}.{field_name}")
}

/// Value expression of a dimension, applying its grain when it has one.
pub(crate) fn dimension_expr(dialect: &dyn Dialect, dim: &Dimension) -> GrainExpr {
    let col = column_ref(&dim.table_id, &dim.field_name);
    match dim.effective_grain() {
        Some(grain) => dialect.grain_expr(&col, dim.data_type, grain),
        None => GrainExpr::value(col),
    }
}

fn measure_expr(dialect: &dyn Dialect, measure: &Measure) -> String {
    let col = column_ref(&measure.table_id, &measure.field_name);
    let value = match measure.effective_grain() {
        Some(grain) => dialect.grain_expr(&col, measure.data_type, grain).value,
        None => col,
    };
    dialect.render_aggregation(measure.aggr, &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Vendor;
    use crate::models::{Aggregation, DataType, TimeGrain, WindowFunction, WindowKind};

    fn region_sales() -> Query {
        Query {
            dimensions: vec![Dimension::new("pos", "region", DataType::Text)],
            measures: vec![Measure::new("pos", "sales", Aggregation::Sum)],
            filter_panels: Vec::new(),
        }
    }

    #[test]
    fn plain_dimension_and_measure() {
        let map = build_select_clause(Vendor::MySql.dialect(), &region_sales()).unwrap();
        assert_eq!(
            map.rendered_select(),
            vec!["pos.region AS region", "SUM(pos.sales) AS sum__sales"]
        );
        assert_eq!(map.group_by, vec!["pos.region"]);
        assert_eq!(map.order_by, vec!["pos.region"]);
    }

    #[test]
    fn month_grain_orders_by_sort_key() {
        let mut query = region_sales();
        query.dimensions = vec![
            Dimension::new("pos", "order_date", DataType::Date).with_grain(TimeGrain::Month),
        ];
        let map = build_select_clause(Vendor::MySql.dialect(), &query).unwrap();
        assert_eq!(map.select[0].render(), "MONTHNAME(pos.order_date) AS month__order_date");
        assert_eq!(
            map.group_by,
            vec!["MONTHNAME(pos.order_date)", "MONTH(pos.order_date)"]
        );
        assert_eq!(map.order_by, vec!["MONTH(pos.order_date)"]);
        assert!(!map.has_role(FragmentRole::SortKey));
    }

    #[test]
    fn bigquery_projects_sort_keys() {
        let mut query = region_sales();
        query.dimensions = vec![
            Dimension::new("pos", "order_date", DataType::Date).with_grain(TimeGrain::DayOfWeek),
        ];
        let map = build_select_clause(Vendor::BigQuery.dialect(), &query).unwrap();
        let sort = map
            .select
            .iter()
            .find(|f| f.is(FragmentRole::SortKey))
            .unwrap();
        assert_eq!(sort.render(), "EXTRACT(DAYOFWEEK FROM pos.order_date) AS dayofweek__order_date_sort");
    }

    #[test]
    fn window_measure_inline_for_postgres() {
        let mut query = region_sales();
        query.measures = vec![
            Measure::new("pos", "sales", Aggregation::Sum).with_window(WindowFunction::new(WindowKind::Rank)),
        ];
        let map = build_select_clause(Vendor::Postgres.dialect(), &query).unwrap();
        assert_eq!(
            map.select[1].render(),
            "RANK() OVER (ORDER BY SUM(pos.sales) DESC) AS sum__sales"
        );
        assert!(map.select[1].is(FragmentRole::WindowFunction));
        assert!(!map.has_role(FragmentRole::MeasureInput));
    }

    #[test]
    fn window_measure_hoisted_for_bigquery() {
        let mut query = region_sales();
        query.measures = vec![Measure::new("pos", "sales", Aggregation::Sum)
            .with_window(WindowFunction::new(WindowKind::RunningTotal))];
        let map = build_select_clause(Vendor::BigQuery.dialect(), &query).unwrap();
        assert_eq!(map.select[1].render(), "SUM(pos.sales) AS sum__sales_value");
        assert!(map.select[1].is(FragmentRole::MeasureInput));
        assert_eq!(
            map.select[2].render(),
            "SUM(sum__sales_value) OVER (ORDER BY region ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS sum__sales"
        );
    }

    #[test]
    fn empty_query_is_rejected() {
        let err = build_select_clause(Vendor::MySql.dialect(), &Query::default()).unwrap_err();
        assert!(matches!(err, QuerycraftError::EmptyQuery(_)));
    }
}
