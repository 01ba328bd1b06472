use crate::core::chem::canonical::Canonicalizer;
use crate::core::io::tables::{TableLoadError, find_column, open_csv};
use crate::core::models::molecule::{IdentityKey, Molecule};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Decides whether a molecule can be bought and therefore ends a route branch.
pub trait Stock {
    fn is_purchasable(&self, molecule: &Molecule) -> bool;
}

const SMILES_COLUMNS: &[&str] = &["smiles"];
const KEY_COLUMNS: &[&str] = &["identity_key"];

/// A stock defined by a set of identity keys.
///
/// Keys live in the key space of the [`Canonicalizer`] that built them, so a stock and
/// the molecules tested against it must share one canonicalizer.
#[derive(Debug, Default, Clone)]
pub struct KeyStock {
    keys: HashSet<IdentityKey>,
}

impl KeyStock {
    pub fn from_keys(keys: impl IntoIterator<Item = IdentityKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Loads a stock from a CSV file.
    ///
    /// A `smiles` column is preferred: every entry is keyed through `canonicalizer`, and
    /// entries it cannot parse are skipped with a warning. Without one, an
    /// `identity_key` column of precomputed keys is read as-is.
    ///
    /// # Errors
    ///
    /// Returns a [`TableLoadError`] if the file cannot be read, has neither column, or
    /// contains an identity key that is too short.
    pub fn load(path: &Path, canonicalizer: &dyn Canonicalizer) -> Result<Self, TableLoadError> {
        let mut reader = open_csv(path)?;
        let (column, from_smiles) = match find_column(&mut reader, SMILES_COLUMNS, path)? {
            Some(idx) => (idx, true),
            None => match find_column(&mut reader, KEY_COLUMNS, path)? {
                Some(idx) => (idx, false),
                None => {
                    return Err(TableLoadError::MissingColumn {
                        path: path.display().to_string(),
                        column: "smiles",
                    });
                }
            },
        };

        let mut keys = HashSet::new();
        let mut skipped = 0usize;
        for (record_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| TableLoadError::Csv {
                path: path.display().to_string(),
                source: e,
            })?;
            let raw = record.get(column).unwrap_or_default();

            if from_smiles {
                match canonicalizer.identity_key(raw) {
                    Ok(key) => {
                        keys.insert(key);
                    }
                    Err(e) => {
                        debug!("Skipping stock record {}: {}", record_idx + 1, e);
                        skipped += 1;
                    }
                }
            } else {
                let key =
                    IdentityKey::from_hash(raw).ok_or_else(|| TableLoadError::InvalidRecord {
                        path: path.display().to_string(),
                        record: record_idx + 1,
                        message: format!("'{}' is too short for an identity key", raw),
                    })?;
                keys.insert(key);
            }
        }

        if skipped > 0 {
            warn!("Skipped {} unparsable stock entries in {:?}.", skipped, path);
        }
        debug!(count = keys.len(), "Loaded stock identity keys from {:?}", path);
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Stock for KeyStock {
    fn is_purchasable(&self, molecule: &Molecule) -> bool {
        self.keys.contains(molecule.key())
    }
}
