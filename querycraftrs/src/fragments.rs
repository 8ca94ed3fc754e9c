//! Clause fragments produced by a dialect builder for one logical query.
//!
//! Select items are kept structured (expression, alias, role) so the composer
//! can restructure a statement without re-parsing generated SQL.

use std::collections::HashSet;

use crate::error::{QuerycraftError, Result};

/// What a select item is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentRole {
    /// Ordinary dimension or measure column.
    Plain,
    /// Aggregate feeding a window function; never projected on its own once hoisted.
    MeasureInput,
    /// Windowed aggregate; must be computed outside a grouped sub-select.
    WindowFunction,
    /// Helper column that only exists to order another column correctly.
    SortKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectFragment {
    pub expr: String,
    pub alias: Option<String>,
    pub role: FragmentRole,
}

impl SelectFragment {
    pub fn new(expr: impl Into<String>, alias: impl Into<String>, role: FragmentRole) -> Self {
        Self {
            expr: expr.into(),
            alias: Some(alias.into()),
            role,
        }
    }

    pub fn plain(expr: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(expr, alias, FragmentRole::Plain)
    }

    pub fn is(&self, role: FragmentRole) -> bool {
        self.role == role
    }

    /// The alias an enclosing query uses to re-project this item.
    pub fn require_alias(&self) -> Result<&str> {
        self.alias.as_deref().ok_or_else(|| {
            QuerycraftError::MalformedFragment(format!(
                "select item `{}` has no alias to re-project",
                self.expr
            ))
        })
    }

    pub fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", self.expr, alias),
            None => self.expr.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClauseFragmentMap {
    pub select: Vec<SelectFragment>,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
}

impl ClauseFragmentMap {
    pub fn has_role(&self, role: FragmentRole) -> bool {
        self.select.iter().any(|f| f.is(role))
    }

    pub fn rendered_select(&self) -> Vec<String> {
        self.select.iter().map(SelectFragment::render).collect()
    }

    pub fn distinct_group_by(&self) -> Vec<String> {
        dedup_stable(&self.group_by)
    }

    pub fn distinct_order_by(&self) -> Vec<String> {
        dedup_stable(&self.order_by)
    }
}

/// Drop repeated entries, keeping the first occurrence of each.
pub fn dedup_stable(items: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let items: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedup_stable(&items), vec!["b", "a", "c"]);
    }

    #[test]
    fn fragment_without_alias_is_malformed() {
        let fragment = SelectFragment {
            expr: "SUM(pos.sales)".to_string(),
            alias: None,
            role: FragmentRole::Plain,
        };
        assert_eq!(fragment.render(), "SUM(pos.sales)");
        assert!(matches!(
            fragment.require_alias(),
            Err(QuerycraftError::MalformedFragment(_))
        ));
    }

    #[test]
    fn renders_alias_suffix() {
        let fragment = SelectFragment::plain("pos.region", "region");
        assert_eq!(fragment.render(), "pos.region AS region");
        assert_eq!(fragment.require_alias().unwrap(), "region");
    }
}
