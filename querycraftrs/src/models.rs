use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One analytical request: the fields a chart asks for plus its filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub filter_panels: Vec<FilterPanel>,
}

impl Query {
    /// Every table id the query touches, in first-occurrence order.
    pub fn table_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        let dims = self.dimensions.iter().map(|d| d.table_id.as_str());
        let measures = self.measures.iter().map(|m| m.table_id.as_str());
        let filters = self
            .filter_panels
            .iter()
            .flat_map(|p| p.filters.iter())
            .map(|f| f.table_id.as_str());
        for id in dims.chain(measures).chain(filters) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub table_id: String,
    pub field_name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub time_grain: Option<TimeGrain>,
    #[serde(default)]
    pub rollup_depth: bool,
    /// Explicit output alias; derived from field and grain when absent.
    #[serde(default)]
    pub alias: Option<String>,
}

impl Dimension {
    pub fn new(table_id: &str, field_name: &str, data_type: DataType) -> Self {
        Self {
            table_id: table_id.to_string(),
            field_name: field_name.to_string(),
            data_type,
            time_grain: None,
            rollup_depth: false,
            alias: None,
        }
    }

    pub fn with_grain(mut self, grain: TimeGrain) -> Self {
        self.time_grain = Some(grain);
        self
    }

    pub fn with_rollup_depth(mut self) -> Self {
        self.rollup_depth = true;
        self
    }

    pub fn output_alias(&self) -> String {
        match (&self.alias, self.effective_grain()) {
            (Some(alias), _) => alias.clone(),
            (None, Some(grain)) => sanitize_alias(&format!("{}__{}", grain.as_str(), self.field_name)),
            (None, None) => sanitize_alias(&self.field_name),
        }
    }

    /// The grain only applies to temporal columns.
    pub fn effective_grain(&self) -> Option<TimeGrain> {
        if self.data_type.is_temporal() {
            self.time_grain
        } else {
            None
        }
    }

    /// Two dimensions select the same column when table, field and grain match.
    /// The rollup flag is ignored.
    pub fn same_field(&self, other: &Dimension) -> bool {
        self.table_id == other.table_id
            && self.field_name == other.field_name
            && self.effective_grain() == other.effective_grain()
    }

    /// Copy of this dimension reading the already-grained column of a derived table.
    pub fn rolled_into(&self, table: &str) -> Dimension {
        let alias = self.output_alias();
        Dimension {
            table_id: table.to_string(),
            field_name: alias.clone(),
            data_type: self.data_type,
            time_grain: None,
            rollup_depth: self.rollup_depth,
            alias: Some(alias),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub table_id: String,
    pub field_name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub time_grain: Option<TimeGrain>,
    pub aggr: Aggregation,
    #[serde(default)]
    pub window_fn: Option<WindowFunction>,
    #[serde(default)]
    pub alias: Option<String>,
}

impl Measure {
    pub fn new(table_id: &str, field_name: &str, aggr: Aggregation) -> Self {
        Self {
            table_id: table_id.to_string(),
            field_name: field_name.to_string(),
            data_type: DataType::Decimal,
            time_grain: None,
            aggr,
            window_fn: None,
            alias: None,
        }
    }

    pub fn with_window(mut self, window: WindowFunction) -> Self {
        self.window_fn = Some(window);
        self
    }

    pub fn output_alias(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => sanitize_alias(&format!("{}__{}", self.aggr.as_str(), self.field_name)),
        }
    }

    pub fn effective_grain(&self) -> Option<TimeGrain> {
        if self.data_type.is_temporal() {
            self.time_grain
        } else {
            None
        }
    }

    /// Copy of this measure re-aggregating its own output column in a derived table.
    pub fn rolled_into(&self, table: &str) -> Measure {
        let alias = self.output_alias();
        Measure {
            table_id: table.to_string(),
            field_name: alias.clone(),
            data_type: DataType::Decimal,
            time_grain: None,
            aggr: self.aggr.rollup(),
            window_fn: None,
            alias: Some(alias),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    Timestamp,
}

impl DataType {
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGrain {
    Year,
    Quarter,
    Month,
    YearQuarter,
    YearMonth,
    Date,
    DayOfWeek,
    DayOfMonth,
}

impl TimeGrain {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGrain::Year => "year",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Month => "month",
            TimeGrain::YearQuarter => "yearquarter",
            TimeGrain::YearMonth => "yearmonth",
            TimeGrain::Date => "date",
            TimeGrain::DayOfWeek => "dayofweek",
            TimeGrain::DayOfMonth => "dayofmonth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    #[serde(rename = "sum")]
    Sum,
    #[serde(rename = "avg")]
    Avg,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "countnn")]
    CountNonNull,
    #[serde(rename = "countu")]
    CountUnique,
    #[serde(rename = "countn")]
    CountNull,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
            Aggregation::CountNonNull => "countnn",
            Aggregation::CountUnique => "countu",
            Aggregation::CountNull => "countn",
        }
    }

    /// Aggregation applied when an already aggregated column is rolled up again.
    /// Counts become sums of counts; the rest reuse their own function.
    pub fn rollup(&self) -> Aggregation {
        match self {
            Aggregation::Count
            | Aggregation::CountNonNull
            | Aggregation::CountUnique
            | Aggregation::CountNull => Aggregation::Sum,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFunction {
    pub kind: WindowKind,
    #[serde(default)]
    pub direction: SortDirection,
}

impl WindowFunction {
    pub fn new(kind: WindowKind) -> Self {
        Self {
            kind,
            direction: SortDirection::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    Rank,
    DenseRank,
    RowNumber,
    RunningTotal,
    PercentOfTotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPanel {
    #[serde(default)]
    pub panel_name: Option<String>,
    #[serde(default = "default_true")]
    pub should_all_conditions_match: bool,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub table_id: String,
    pub field_name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub time_grain: Option<TimeGrain>,
    #[serde(default)]
    pub should_exclude: bool,
    pub operator: FilterOperator,
    #[serde(default)]
    pub user_selection: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    In,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    Between,
    BeginsWith,
    EndsWith,
    Contains,
}

fn default_true() -> bool {
    true
}

/// Replace anything that is not a plain identifier character with `_`.
pub fn sanitize_alias(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
