use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("catalog lists element '{0}' more than once")]
    DuplicateElement(String),
    #[error("catalog entry #{0} has an empty element name")]
    EmptyElement(usize),
}

/// Catalog metadata for one element. Column names follow the elements sheet
/// (`Element`, `Unit`, `People_per_Unit`) so exported sheets load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(alias = "Element")]
    pub element: String,
    #[serde(alias = "Unit")]
    pub unit: String,
    /// Crew used when a request leaves the crew size blank.
    #[serde(default, alias = "People_per_Unit", skip_serializing_if = "Option::is_none")]
    pub default_crew: Option<u32>,
}

impl CatalogEntry {
    pub fn new(element: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            unit: unit.into(),
            default_crew: None,
        }
    }

    pub fn with_default_crew(mut self, crew: u32) -> Self {
        self.default_crew = Some(crew);
        self
    }
}

/// Resolves element names to their catalog metadata.
pub trait Catalog {
    fn resolve(&self, element_id: &str) -> Option<&CatalogEntry>;
    fn entries(&self) -> Vec<&CatalogEntry>;
}

/// In-memory catalog preserving the order elements were listed in.
#[derive(Debug, Clone, Default)]
pub struct ElementCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl ElementCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            let name = entry.element.trim();
            if name.is_empty() {
                return Err(CatalogError::EmptyElement(pos));
            }
            if index.insert(name.to_string(), pos).is_some() {
                return Err(CatalogError::DuplicateElement(name.to_string()));
            }
        }
        Ok(Self { entries, index })
    }

    /// Small built-in catalog used when no catalog file is configured.
    pub fn sample() -> Self {
        let entries = vec![
            CatalogEntry::new("Brickwork", "m2").with_default_crew(2),
            CatalogEntry::new("Blockwork", "m2").with_default_crew(2),
            CatalogEntry::new("Plastering", "m2").with_default_crew(1),
            CatalogEntry::new("Flooring", "m2").with_default_crew(2),
            CatalogEntry::new("Roof Tiling", "m2").with_default_crew(3),
            CatalogEntry::new("Windows", "nr").with_default_crew(2),
            CatalogEntry::new("Internal Doors", "nr").with_default_crew(1),
            CatalogEntry::new("Painting", "m2").with_default_crew(1),
        ];
        // names above are unique and non-empty
        Self::new(entries).unwrap_or_default()
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let mut entries = Vec::new();
        for record in reader.deserialize::<CatalogEntry>() {
            entries.push(record?);
        }
        Self::new(entries)
    }

    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_reader(file)?;
        Self::new(entries)
    }

    /// Loads by extension: `.json` as a JSON array, anything else as CSV.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(path)
        } else {
            Self::from_csv(path)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<CatalogEntry> {
        self.entries.clone()
    }
}

impl Catalog for ElementCatalog {
    fn resolve(&self, element_id: &str) -> Option<&CatalogEntry> {
        self.index
            .get(element_id.trim())
            .and_then(|pos| self.entries.get(*pos))
    }

    fn entries(&self) -> Vec<&CatalogEntry> {
        self.entries.iter().collect()
    }
}
