//! JSON dataset and catalog loading

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use whiff_core::catalog::deserialize_notes;
use whiff_core::{CatalogItem, ItemId, UserContext};

/// One labelled row of the training dataset
///
/// The six context fields sit at the top level of the JSON object, next to
/// the notes and the emotion cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub notes: Vec<String>,
    #[serde(flatten)]
    pub context: UserContext,
    pub emotion_cluster: usize,
}

impl TrainingRecord {
    /// View this row as a catalog item; rows without an id use their position
    pub fn to_catalog_item(&self, position: usize) -> CatalogItem {
        CatalogItem {
            id: self.id.clone().unwrap_or(ItemId::Integer(position as u64)),
            name: self.name.clone(),
            brand: self.brand.clone(),
            notes: self.notes.clone(),
            emotion_cluster: self.emotion_cluster,
        }
    }
}

/// Read any JSON document from disk
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogItem>> {
    let catalog: Vec<CatalogItem> = load_json(path)?;
    tracing::info!(items = catalog.len(), "loaded catalog");
    Ok(catalog)
}

pub fn load_training_records<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingRecord>> {
    let records: Vec<TrainingRecord> = load_json(path)?;
    tracing::info!(rows = records.len(), "loaded training dataset");
    Ok(records)
}

/// Catalog view of a training dataset
pub fn catalog_from_records(records: &[TrainingRecord]) -> Vec<CatalogItem> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| r.to_catalog_item(i))
        .collect()
}
