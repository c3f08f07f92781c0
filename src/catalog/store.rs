use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::hairpin::{HairpinModel, ModelError};
use crate::parsing::fasta::read_sequences;
use crate::parsing::ParseError;
use crate::sequences::{OligoSpec, Scanner, SequenceError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to read sequences: {0}")]
    Sequences(#[from] ParseError),

    #[error("Invalid oligos: {0}")]
    Oligos(#[from] SequenceError),

    #[error("Invalid hairpin {name}: {source}")]
    InvalidModel {
        name: String,
        #[source]
        source: ModelError,
    },
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oligos: Option<OligoSpec>,
    pub hairpins: BTreeMap<String, HairpinModel>,
}

/// Candidate hairpins, iterated by name.
#[derive(Debug, Clone, Default)]
pub struct HairpinCatalog {
    hairpins: BTreeMap<String, HairpinModel>,
    oligos: Option<OligoSpec>,
}

impl HairpinCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build models by scanning named sequences for an oligo set
    #[must_use]
    pub fn from_sequences(sequences: &[(String, String)], oligos: &OligoSpec) -> Self {
        let scanner = Scanner::new(oligos);
        let mut catalog = Self {
            hairpins: BTreeMap::new(),
            oligos: Some(oligos.clone()),
        };

        for (name, sequence) in sequences {
            let model = HairpinModel::from_scan(sequence.len(), &scanner.scan(sequence), oligos);
            debug!(
                "Hairpin {name}: {} bp, {} bindings",
                sequence.len(),
                model.bindings()
            );
            if catalog.hairpins.insert(name.clone(), model).is_some() {
                warn!("Duplicate hairpin name {name}: keeping the last sequence");
            }
        }
        catalog
    }

    /// Read a sequence source and scan it for an oligo set
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Sequences` if the source cannot be read.
    pub fn load_sequences(source: &str, oligos: &OligoSpec) -> Result<Self, CatalogError> {
        let sequences = read_sequences(source)?;
        Ok(Self::from_sequences(&sequences, oligos))
    }

    /// Load catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or holds invalid models.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse catalog from JSON string
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or holds invalid models.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                "Catalog version mismatch (expected {CATALOG_VERSION}, found {})",
                data.version
            );
        }

        let mut catalog = Self {
            hairpins: BTreeMap::new(),
            oligos: data.oligos,
        };
        for (name, model) in data.hairpins {
            // Deserialization bypasses the constructor checks
            let model = HairpinModel::new(model.peaks().to_vec(), model.single_strand)
                .map_err(|source| CatalogError::InvalidModel {
                    name: name.clone(),
                    source,
                })?;
            catalog.add(name, model);
        }
        Ok(catalog)
    }

    /// Export catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            oligos: self.oligos.clone(),
            hairpins: self.hairpins.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Add or replace a hairpin
    pub fn add(&mut self, name: impl Into<String>, model: HairpinModel) {
        self.hairpins.insert(name.into(), model);
    }

    /// Get a hairpin by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HairpinModel> {
        self.hairpins.get(name)
    }

    /// Oligos the models were built with, if known
    #[must_use]
    pub fn oligos(&self) -> Option<&OligoSpec> {
        self.oligos.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HairpinModel)> {
        self.hairpins.iter()
    }

    /// Name to model map
    #[must_use]
    pub fn hairpins(&self) -> &BTreeMap<String, HairpinModel> {
        &self.hairpins
    }

    /// Number of hairpins in catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.hairpins.len()
    }

    /// Check if catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hairpins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequences::split;

    fn sequences() -> Vec<(String, String)> {
        vec![
            ("hp100".to_string(), "atcgATATATgtcgCCCaaGGG".to_string()),
            ("hp101".to_string(), "cccATATATgtcgaaGGGatcg".to_string()),
        ]
    }

    #[test]
    fn test_from_sequences() {
        let catalog = HairpinCatalog::from_sequences(&sequences(), &split("atat,ccc").unwrap());
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("hp100").unwrap().peaks(),
            &[0.0, 8.0, 10.0, 17.0, 22.0]
        );
        let names: Vec<&String> = catalog.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["hp100", "hp101"]);
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_json_round_trip_keeps_models() {
        let catalog = HairpinCatalog::from_sequences(&sequences(), &split("atat,ccc,$").unwrap());
        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("hp101"));

        let loaded = HairpinCatalog::from_json(&json).unwrap();
        assert_eq!(loaded.hairpins(), catalog.hairpins());
        assert_eq!(loaded.oligos(), catalog.oligos());
    }

    #[test]
    fn test_from_json_rejects_invalid_models() {
        let json = r#"{"version": "1.0.0", "created_at": "",
            "hairpins": {"bad": {"peaks": [10.0, 5.0], "single_strand": true}}}"#;
        assert!(matches!(
            HairpinCatalog::from_json(json),
            Err(CatalogError::InvalidModel { ref name, .. }) if name == "bad"
        ));
    }

    #[test]
    fn test_add_hairpin() {
        let mut catalog = HairpinCatalog::new();
        assert!(catalog.is_empty());
        catalog.add("hp", HairpinModel::new(vec![0.0, 5.0, 12.0, 20.0], true).unwrap());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("hp").unwrap().bindings(), 2);
    }
}
