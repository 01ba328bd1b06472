use super::ScoringError;
use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_FINGERPRINT_DIM: usize = 2048;
pub const DEFAULT_FINGERPRINT_RADIUS: usize = 2;

/// A heuristic cost-to-go: how expensive it is to synthesize a molecule further.
///
/// Estimates are nonnegative and depend only on the molecule string.
pub trait ValueEstimator {
    fn estimate(&self, smiles: &str) -> Result<f64, ScoringError>;
}

impl<F> ValueEstimator for F
where
    F: Fn(&str) -> Result<f64, ScoringError>,
{
    fn estimate(&self, smiles: &str) -> Result<f64, ScoringError> {
        self(smiles)
    }
}

/// Assigns the same estimate to every molecule, reducing the search to plain cost ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantValueEstimator(pub f64);

impl ValueEstimator for ConstantValueEstimator {
    fn estimate(&self, _smiles: &str) -> Result<f64, ScoringError> {
        Ok(self.0)
    }
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Layer {layer} has an invalid shape: {message}")]
    Shape { layer: usize, message: String },
    #[error("Model has no layers")]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ModelFile {
    fingerprint_dim: usize,
    #[serde(default = "default_radius")]
    radius: usize,
    layers: Vec<LayerFile>,
}

fn default_radius() -> usize {
    DEFAULT_FINGERPRINT_RADIUS
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerFile {
    /// Row-major, one row per output unit.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
}

/// A feed-forward value network over hashed substring fingerprints.
///
/// Every layer but the last is followed by a ReLU; the single output is passed through
/// softplus so the estimate is always nonnegative.
#[derive(Debug, Clone)]
pub struct MlpValueEstimator {
    fingerprint_dim: usize,
    radius: usize,
    layers: Vec<DenseLayer>,
}

impl MlpValueEstimator {
    /// Builds a network from `(weights, bias)` pairs, checking that the shapes chain.
    pub fn from_layers(
        fingerprint_dim: usize,
        radius: usize,
        layers: Vec<(DMatrix<f64>, DVector<f64>)>,
    ) -> Result<Self, ModelLoadError> {
        if layers.is_empty() {
            return Err(ModelLoadError::Empty);
        }

        let mut expected_inputs = fingerprint_dim;
        for (idx, (weights, bias)) in layers.iter().enumerate() {
            if weights.ncols() != expected_inputs {
                return Err(ModelLoadError::Shape {
                    layer: idx,
                    message: format!(
                        "expected {} inputs, found {}",
                        expected_inputs,
                        weights.ncols()
                    ),
                });
            }
            if bias.len() != weights.nrows() {
                return Err(ModelLoadError::Shape {
                    layer: idx,
                    message: format!(
                        "bias has {} entries for {} outputs",
                        bias.len(),
                        weights.nrows()
                    ),
                });
            }
            expected_inputs = weights.nrows();
        }
        if expected_inputs != 1 {
            return Err(ModelLoadError::Shape {
                layer: layers.len() - 1,
                message: format!("final layer must have 1 output, found {}", expected_inputs),
            });
        }

        Ok(Self {
            fingerprint_dim,
            radius,
            layers: layers
                .into_iter()
                .map(|(weights, bias)| DenseLayer { weights, bias })
                .collect(),
        })
    }

    /// Loads a model from a TOML weights file.
    ///
    /// ```toml
    /// fingerprint-dim = 2048
    /// radius = 2
    ///
    /// [[layers]]
    /// weights = [[...], ...]  # one row per output unit
    /// bias = [...]
    /// ```
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: ModelFile = toml::from_str(&content).map_err(|e| ModelLoadError::Toml {
            path: path.display().to_string(),
            source: e,
        })?;

        let layers = file
            .layers
            .into_iter()
            .enumerate()
            .map(|(idx, layer)| {
                let rows = layer.weights.len();
                let cols = layer.weights.first().map_or(0, Vec::len);
                if layer.weights.iter().any(|row| row.len() != cols) {
                    return Err(ModelLoadError::Shape {
                        layer: idx,
                        message: "weight rows have different lengths".to_string(),
                    });
                }
                let flat: Vec<f64> = layer.weights.into_iter().flatten().collect();
                Ok((
                    DMatrix::from_row_slice(rows, cols, &flat),
                    DVector::from_vec(layer.bias),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let model = Self::from_layers(file.fingerprint_dim, file.radius, layers)?;
        info!(
            layers = model.layers.len(),
            fingerprint_dim = model.fingerprint_dim,
            "Loaded value model from {:?}",
            path
        );
        Ok(model)
    }

    pub fn fingerprint_dim(&self) -> usize {
        self.fingerprint_dim
    }

    fn forward(&self, input: DVector<f64>) -> f64 {
        let last = self.layers.len() - 1;
        let output = self
            .layers
            .iter()
            .enumerate()
            .fold(input, |x, (idx, layer)| {
                let z = &layer.weights * x + &layer.bias;
                if idx == last { z } else { z.map(|v| v.max(0.0)) }
            });
        softplus(output[0])
    }
}

impl ValueEstimator for MlpValueEstimator {
    fn estimate(&self, smiles: &str) -> Result<f64, ScoringError> {
        let value = self.forward(fingerprint(smiles, self.fingerprint_dim, self.radius));
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ScoringError::ValueEstimator {
                smiles: smiles.to_string(),
                message: format!("non-finite estimate {}", value),
            })
        }
    }
}

fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Folded bit fingerprint of every substring of up to `radius + 1` characters.
pub fn fingerprint(smiles: &str, dim: usize, radius: usize) -> DVector<f64> {
    let mut bits = DVector::zeros(dim);
    if dim == 0 {
        return bits;
    }
    let chars: Vec<char> = smiles.chars().collect();
    for width in 1..=radius + 1 {
        for window in chars.windows(width) {
            let slot = (fnv1a(window) % dim as u64) as usize;
            bits[slot] = 1.0;
        }
    }
    bits
}

fn fnv1a(symbols: &[char]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut buf = [0u8; 4];
    symbols.iter().fold(OFFSET, |hash, c| {
        c.encode_utf8(&mut buf)
            .bytes()
            .fold(hash, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME))
    })
}
