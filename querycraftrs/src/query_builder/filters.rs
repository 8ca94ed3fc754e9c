use serde_json::Value;

use crate::dialect::{Dialect, GrainExpr};
use crate::error::{QuerycraftError, Result};
use crate::models::{Filter, FilterOperator, FilterPanel};

use super::select::column_ref;

/// Render filter panels as the body of a WHERE clause (empty when nothing filters).
///
/// Panels are AND-ed together; filters inside a panel are AND-ed or OR-ed
/// depending on `should_all_conditions_match`.
pub fn build_where_clause(panels: &[FilterPanel], dialect: &dyn Dialect) -> Result<String> {
    let mut rendered_panels = Vec::new();
    for panel in panels {
        let mut conditions = Vec::new();
        for filter in &panel.filters {
            if let Some(condition) = render_filter(filter, dialect)? {
                conditions.push(condition);
            }
        }
        let joiner = if panel.should_all_conditions_match {
            " AND "
        } else {
            " OR "
        };
        match conditions.len() {
            0 => {}
            1 => rendered_panels.push(conditions.remove(0)),
            _ => rendered_panels.push(format!("({})", conditions.join(joiner))),
        }
    }
    Ok(rendered_panels.join("\n\tAND "))
}

fn render_filter(filter: &Filter, dialect: &dyn Dialect) -> Result<Option<String>> {
    let col = column_ref(&filter.table_id, &filter.field_name);
    let field = match filter.time_grain.filter(|_| filter.data_type.is_temporal()) {
        Some(grain) => dialect.grain_expr(&col, filter.data_type, grain),
        None => GrainExpr::value(col),
    }
    .value;
    let values = &filter.user_selection;

    let condition = match filter.operator {
        FilterOperator::In => {
            if values.is_empty() {
                return Ok(None);
            }
            let list: Vec<String> = values.iter().map(|v| dialect.render_literal(v)).collect();
            let not_kw = if filter.should_exclude { "NOT " } else { "" };
            return Ok(Some(format!("{field} {not_kw}IN ({})", list.join(", "))));
        }
        FilterOperator::Between => match values.as_slice() {
            [low, high] => format!(
                "{field} BETWEEN {} AND {}",
                dialect.render_literal(low),
                dialect.render_literal(high)
            ),
            _ => {
                return Err(QuerycraftError::InvalidFilter(format!(
                    "between on {}.{} needs exactly two values, got {}",
                    filter.table_id,
                    filter.field_name,
                    values.len()
                )))
            }
        },
        FilterOperator::BeginsWith | FilterOperator::EndsWith | FilterOperator::Contains => {
            let text = single_value(filter)?;
            let text = match text {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let pattern = match filter.operator {
                FilterOperator::BeginsWith => dialect.render_like_pattern(&text, false, true),
                FilterOperator::EndsWith => dialect.render_like_pattern(&text, true, false),
                _ => dialect.render_like_pattern(&text, true, true),
            };
            format!("{field} LIKE {pattern}")
        }
        FilterOperator::EqualTo => comparison(filter, dialect, &field, "=")?,
        FilterOperator::NotEqualTo => comparison(filter, dialect, &field, "<>")?,
        FilterOperator::GreaterThan => comparison(filter, dialect, &field, ">")?,
        FilterOperator::GreaterThanOrEqualTo => comparison(filter, dialect, &field, ">=")?,
        FilterOperator::LessThan => comparison(filter, dialect, &field, "<")?,
        FilterOperator::LessThanOrEqualTo => comparison(filter, dialect, &field, "<=")?,
    };

    if filter.should_exclude {
        Ok(Some(format!("NOT ({condition})")))
    } else {
        Ok(Some(condition))
    }
}

fn comparison(filter: &Filter, dialect: &dyn Dialect, field: &str, symbol: &str) -> Result<String> {
    let value = dialect.render_literal(single_value(filter)?);
    Ok(format!("{field} {symbol} {value}"))
}

fn single_value(filter: &Filter) -> Result<&Value> {
    match filter.user_selection.as_slice() {
        [value] => Ok(value),
        other => Err(QuerycraftError::InvalidFilter(format!(
            "{:?} on {}.{} needs exactly one value, got {}",
            filter.operator,
            filter.table_id,
            filter.field_name,
            other.len()
        ))),
    }
}
