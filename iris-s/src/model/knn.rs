use common::{FeatureVector, Species, NUM_FEATURES};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode JSON model artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode binary model artifact: {0}")]
    Bincode(#[from] bincode::error::DecodeError),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Pre-trained K-nearest-neighbors classifier.
///
/// Uniform weights and Euclidean distance. Among equally distant samples the
/// lower index wins, and a tied vote goes to the smallest label, so a given
/// input always maps to the same class.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KnnModel {
    pub n_neighbors: u32,
    pub samples: Vec<[f64; NUM_FEATURES]>,
    pub labels: Vec<u8>,
}

impl KnnModel {
    pub fn new(
        n_neighbors: u32,
        samples: Vec<[f64; NUM_FEATURES]>,
        labels: Vec<u8>,
    ) -> Result<Self, ModelLoadError> {
        let model = Self {
            n_neighbors,
            samples,
            labels,
        };
        model.validate()?;
        Ok(model)
    }

    /// Reads an artifact from disk. `.json` files are decoded with serde_json,
    /// everything else as bincode (standard config).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ModelLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let model = if is_json {
            Self::from_json_slice(&bytes)?
        } else {
            Self::from_bincode_slice(&bytes)?
        };
        Ok(model)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let model: KnnModel = serde_json::from_slice(bytes)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_bincode_slice(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let (model, _): (KnnModel, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_bincode(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.samples.is_empty() {
            return Err(ModelLoadError::Invalid("no training samples".into()));
        }
        if self.samples.len() != self.labels.len() {
            return Err(ModelLoadError::Invalid(format!(
                "{} samples but {} labels",
                self.samples.len(),
                self.labels.len()
            )));
        }
        if self.n_neighbors == 0 || self.n_neighbors as usize > self.samples.len() {
            return Err(ModelLoadError::Invalid(format!(
                "n_neighbors must be in 1..={}, got {}",
                self.samples.len(),
                self.n_neighbors
            )));
        }
        if let Some(pos) = self
            .labels
            .iter()
            .position(|&l| Species::try_from(l).is_err())
        {
            return Err(ModelLoadError::Invalid(format!(
                "label {} at sample {} is not a known species",
                self.labels[pos], pos
            )));
        }
        if let Some(pos) = self
            .samples
            .iter()
            .position(|s| s.iter().any(|v| !v.is_finite()))
        {
            return Err(ModelLoadError::Invalid(format!(
                "sample {pos} contains a non-finite value"
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn predict(&self, features: &FeatureVector) -> Species {
        let x = features.to_array();
        let k = self.n_neighbors as usize;

        let mut dist: Vec<(f64, usize)> = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, s)| (squared_distance(s, &x), i))
            .collect();

        let by_distance =
            |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        if k < dist.len() {
            dist.select_nth_unstable_by(k - 1, by_distance);
        }

        let mut votes = [0u32; Species::ALL.len()];
        for &(_, i) in &dist[..k] {
            votes[self.labels[i] as usize] += 1;
        }

        let mut best = 0;
        for label in 1..votes.len() {
            if votes[label].cmp(&votes[best]) == Ordering::Greater {
                best = label;
            }
        }
        Species::ALL[best]
    }

    pub fn predict_batch(&self, batch: &[FeatureVector]) -> Vec<Species> {
        batch.iter().map(|f| self.predict(f)).collect()
    }
}

#[inline]
fn squared_distance(a: &[f64; NUM_FEATURES], b: &[f64; NUM_FEATURES]) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q) * (p - q)).sum()
}
