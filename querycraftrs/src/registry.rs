use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glob::glob;

use crate::dataset::DatasetSchema;
use crate::error::{QuerycraftError, Result};

/// Dataset schemas keyed by name.
#[derive(Debug, Default, Clone)]
pub struct DatasetRegistry {
    pub datasets: HashMap<String, DatasetSchema>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(datasets: Vec<DatasetSchema>) -> Self {
        let mut registry = DatasetRegistry::new();
        for dataset in datasets {
            registry.datasets.insert(dataset.name.clone(), dataset);
        }
        registry
    }

    /// Load every `*.yml`, `*.yaml` and `*.json` dataset file in `dir`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(QuerycraftError::Config(format!(
                "dataset directory not found: {}",
                dir.display()
            )));
        }
        let mut registry = DatasetRegistry::new();
        for extension in ["yml", "yaml", "json"] {
            for entry in glob(&format!("{}/*.{extension}", dir.display()))
                .map_err(|e| QuerycraftError::Other(e.into()))?
                .flatten()
            {
                registry.load_dataset_file(&entry)?;
            }
        }
        tracing::debug!(
            dir = %dir.display(),
            datasets = registry.datasets.len(),
            "loaded dataset registry"
        );
        Ok(registry)
    }

    fn load_dataset_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path)?;
        let mut dataset: DatasetSchema = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };
        if dataset.name.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                dataset.name = stem.to_string();
            }
        }
        if self.datasets.contains_key(&dataset.name) {
            return Err(QuerycraftError::Config(format!(
                "duplicate dataset {} in {}",
                dataset.name,
                path.display()
            )));
        }
        self.datasets.insert(dataset.name.clone(), dataset);
        Ok(())
    }

    pub fn get_dataset(&self, name: &str) -> Option<&DatasetSchema> {
        self.datasets.get(name)
    }
}
