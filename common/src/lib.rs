use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Column names in the order the model consumes them.
pub const FEATURE_NAMES: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

pub const NUM_FEATURES: usize = FEATURE_NAMES.len();

pub const PREDICT_PATH: &str = "/predict";
pub const BATCH_PREDICT_PATH: &str = "/predict-batch";
pub const METRICS_PATH: &str = "/metrics";
pub const HEALTH_PATH: &str = "/health";

/// One flower sample, measurements in centimeters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

impl FeatureVector {
    pub fn new(sepal_length: f64, sepal_width: f64, petal_length: f64, petal_width: f64) -> Self {
        Self {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        }
    }

    #[inline]
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

impl From<[f64; NUM_FEATURES]> for FeatureVector {
    fn from(v: [f64; NUM_FEATURES]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Body of `POST /predict-batch`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BatchPredictRequest {
    pub feature_list: Vec<FeatureVector>,
}

/// Body returned by `POST /predict`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionResponse {
    pub prediction: u8,
}

// The discriminants are the wire labels. Clients map index -> name with them,
// so the order is frozen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Species {
    Setosa = 0,
    Versicolor = 1,
    Virginica = 2,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Setosa, Species::Versicolor, Species::Virginica];

    pub fn label(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Setosa => "Setosa",
            Species::Versicolor => "Versicolor",
            Species::Virginica => "Virginica",
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown species label {0}, expected 0..=2")]
pub struct UnknownLabel(pub u8);

impl TryFrom<u8> for Species {
    type Error = UnknownLabel;

    fn try_from(label: u8) -> Result<Self, Self::Error> {
        Species::ALL
            .get(label as usize)
            .copied()
            .ok_or(UnknownLabel(label))
    }
}

impl From<Species> for u8 {
    fn from(s: Species) -> u8 {
        s.label()
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EndpointList {
    pub predict: String,
    pub batch_predict: String,
    pub metrics: String,
    pub health: String,
}

/// Response of `GET /`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: EndpointList,
}

/// Error body for every non-2xx response the service produces itself.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub code: u16,
    pub timestamp: DateTime<Utc>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code,
            timestamp: Utc::now(),
        }
    }
}

#[test]
fn test_species_ordering_is_fixed() {
    assert_eq!(Species::try_from(0), Ok(Species::Setosa));
    assert_eq!(Species::try_from(1), Ok(Species::Versicolor));
    assert_eq!(Species::try_from(2), Ok(Species::Virginica));
    assert_eq!(Species::try_from(3), Err(UnknownLabel(3)));
    for (i, s) in Species::ALL.iter().enumerate() {
        assert_eq!(s.label() as usize, i);
    }
}

#[test]
fn test_feature_vector_requires_all_fields() {
    let ok: Result<FeatureVector, _> = serde_json::from_str(
        r#"{"sepal_length":5.1,"sepal_width":3.5,"petal_length":1.4,"petal_width":0.2}"#,
    );
    assert_eq!(ok.unwrap().to_array(), [5.1, 3.5, 1.4, 0.2]);

    let missing: Result<FeatureVector, _> =
        serde_json::from_str(r#"{"sepal_length":5.1,"sepal_width":3.5,"petal_length":1.4}"#);
    assert!(missing.is_err());

    let non_numeric: Result<FeatureVector, _> = serde_json::from_str(
        r#"{"sepal_length":"5.1","sepal_width":3.5,"petal_length":1.4,"petal_width":0.2}"#,
    );
    assert!(non_numeric.is_err());
}

#[test]
fn test_species_serializes_as_label() -> anyhow::Result<()> {
    assert_eq!(serde_json::to_string(&Species::Virginica)?, "2");
    let s: Species = serde_json::from_str("1")?;
    assert_eq!(s, Species::Versicolor);
    assert!(serde_json::from_str::<Species>("7").is_err());
    Ok(())
}
