//! Append-only output column registry

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Definition of one output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Display name
    pub header_name: String,

    /// Row key the column reads
    pub field: String,
}

impl ColumnDef {
    /// A column whose display name is its field key
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            header_name: field.clone(),
            field,
        }
    }
}

/// Ordered set of output columns, unique by field key
///
/// Append-only: once a field is present it is never removed, renamed or
/// moved.
///
/// # Examples
///
/// ```
/// use datarip_extractor::ColumnRegistry;
///
/// let mut registry = ColumnRegistry::seeded(["id", "text"]);
/// let added = registry.merge_keys(["name", "id", "age"]);
/// assert_eq!(added, 2);
/// assert_eq!(registry.fields().collect::<Vec<_>>(), vec!["id", "text", "name", "age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnDef>", into = "Vec<ColumnDef>")]
pub struct ColumnRegistry {
    columns: IndexMap<String, ColumnDef>,
}

impl ColumnRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the given columns, first occurrence wins
    pub fn seeded<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        registry.merge_keys(fields);
        registry
    }

    /// Append a column for every key not yet present, in the order given
    ///
    /// Returns how many columns were added.
    pub fn merge_keys<I, S>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.columns.len();
        for key in keys {
            let key = key.into();
            if !self.columns.contains_key(&key) {
                self.columns.insert(key.clone(), ColumnDef::new(key));
            }
        }
        self.columns.len() - before
    }

    /// Whether a column exists for `field`
    pub fn contains(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    /// Position of `field`, if present
    pub fn position(&self, field: &str) -> Option<usize> {
        self.columns.get_index_of(field)
    }

    /// Field keys in column order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Column definitions in order
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.values()
    }

    /// Owned copy of the column definitions
    pub fn to_vec(&self) -> Vec<ColumnDef> {
        self.columns.values().cloned().collect()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether there are no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Vec<ColumnDef>> for ColumnRegistry {
    fn from(defs: Vec<ColumnDef>) -> Self {
        let mut columns = IndexMap::with_capacity(defs.len());
        for def in defs {
            columns.entry(def.field.clone()).or_insert(def);
        }
        Self { columns }
    }
}

impl From<ColumnRegistry> for Vec<ColumnDef> {
    fn from(registry: ColumnRegistry) -> Self {
        registry.columns.into_values().collect()
    }
}
