use crate::core::chem::canonical::{Canonicalizer, ChemError};
use crate::core::models::task::Task;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DatasetLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Entry '{entry}' is missing field '{field}'")]
    MissingField { entry: String, field: String },
    #[error("Entry '{entry}' has an invalid '{field}' field: {message}")]
    InvalidField {
        entry: String,
        field: String,
        message: String,
    },
    #[error("Entry '{entry}' contains an unusable molecule: {source}")]
    Chemistry { entry: String, source: ChemError },
}

/// One benchmark target as stored on disk, before canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub id: String,
    pub product: String,
    /// Starting materials of each reference reaction tree.
    pub materials: Vec<Vec<String>>,
    pub depth: usize,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    depth: usize,
    num_reaction_trees: CountField,
    #[serde(flatten)]
    trees: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CountField {
    Number(usize),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawReactionTree {
    #[serde(default)]
    retro_routes: Vec<Vec<String>>,
    materials: Vec<String>,
}

/// Parses a reaction-tree collection.
///
/// The collection is a JSON object keyed by entry id. Each entry carries `depth`,
/// `num_reaction_trees` and one object per reference tree under the keys `"1"`..`"n"`,
/// each holding `retro_routes` (reaction strings `product>>reactants`) and `materials`.
/// The target is the product side of the first reaction of tree `"1"`. Entries are
/// returned in file order.
pub fn read_entries(reader: impl Read) -> Result<Vec<DatasetEntry>, DatasetLoadError> {
    let raw: Map<String, Value> = serde_json::from_reader(reader)?;
    raw.into_iter()
        .map(|(id, value)| {
            let entry: RawEntry = serde_json::from_value(value)?;
            convert_entry(id, entry)
        })
        .collect()
}

fn convert_entry(id: String, entry: RawEntry) -> Result<DatasetEntry, DatasetLoadError> {
    let count = match &entry.num_reaction_trees {
        CountField::Number(n) => *n,
        CountField::Text(s) => s.trim().parse().map_err(|_| DatasetLoadError::InvalidField {
            entry: id.clone(),
            field: "num_reaction_trees".to_string(),
            message: format!("'{}' is not an integer", s),
        })?,
    };

    let mut trees = Vec::with_capacity(count);
    for i in 1..=count {
        let field = i.to_string();
        let value = entry
            .trees
            .get(&field)
            .ok_or_else(|| DatasetLoadError::MissingField {
                entry: id.clone(),
                field: field.clone(),
            })?;
        let tree: RawReactionTree =
            serde_json::from_value(value.clone()).map_err(|e| DatasetLoadError::InvalidField {
                entry: id.clone(),
                field: field.clone(),
                message: e.to_string(),
            })?;
        trees.push(tree);
    }

    let product = trees
        .first()
        .and_then(|tree| tree.retro_routes.first())
        .and_then(|route| route.first())
        .and_then(|reaction| reaction.split('>').next())
        .map(str::to_string)
        .ok_or_else(|| DatasetLoadError::MissingField {
            entry: id.clone(),
            field: "1.retro_routes".to_string(),
        })?;

    Ok(DatasetEntry {
        id,
        product,
        materials: trees.into_iter().map(|tree| tree.materials).collect(),
        depth: entry.depth,
    })
}

/// Converts dataset entries into planning tasks, canonicalizing targets and materials.
pub fn entries_to_tasks(
    entries: &[DatasetEntry],
    canonicalizer: &dyn Canonicalizer,
) -> Result<Vec<Task>, DatasetLoadError> {
    entries
        .iter()
        .map(|entry| {
            Task::from_smiles(
                entry.id.clone(),
                &entry.product,
                &entry.materials,
                entry.depth,
                canonicalizer,
            )
            .map_err(|source| DatasetLoadError::Chemistry {
                entry: entry.id.clone(),
                source,
            })
        })
        .collect()
}

/// Loads a dataset file and returns its planning tasks.
pub fn load_tasks(
    path: &Path,
    canonicalizer: &dyn Canonicalizer,
) -> Result<Vec<Task>, DatasetLoadError> {
    debug!("Loading dataset from {:?}", path);
    let file = std::fs::File::open(path).map_err(|e| DatasetLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let entries = read_entries(std::io::BufReader::new(file))?;
    let tasks = entries_to_tasks(&entries, canonicalizer)?;
    info!(count = tasks.len(), "Loaded planning tasks from {:?}", path);
    Ok(tasks)
}
