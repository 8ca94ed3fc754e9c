use serde::{Deserialize, Serialize};

/// Physical tables of a dataset and the links between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tables: Vec<DatasetTable>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl DatasetSchema {
    pub fn table(&self, id: &str) -> Option<&DatasetTable> {
        self.tables.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetTable {
    /// Id used by queries and as the SQL table alias.
    pub id: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    pub table: String,
}

impl DatasetTable {
    pub fn new(id: &str, schema: &str, table: &str) -> Self {
        Self {
            id: id.to_string(),
            database: None,
            schema: Some(schema.to_string()),
            table: table.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub table1: String,
    pub table2: String,
    pub ref_type: RefType,
    #[serde(default)]
    pub cardinality: Option<Cardinality>,
    pub table1_columns: Vec<String>,
    pub table2_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Inner,
    Left,
    Right,
    Full,
}

impl RefType {
    /// Join type seen from `table2` looking back at `table1`.
    pub fn reversed(&self) -> RefType {
        match self {
            RefType::Left => RefType::Right,
            RefType::Right => RefType::Left,
            other => *other,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            RefType::Inner => "INNER JOIN",
            RefType::Left => "LEFT JOIN",
            RefType::Right => "RIGHT JOIN",
            RefType::Full => "FULL OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}
