use common::{FeatureVector, Species, FEATURE_NAMES, NUM_FEATURES};
use csv::StringRecord;
use std::io;

use crate::client::ClientError;

/// A CSV file read for batch prediction. The original records are kept so
/// labels can be written back next to them by position.
#[derive(Debug)]
pub struct CsvBatch {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    pub features: Vec<FeatureVector>,
}

impl CsvBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a CSV with a header row containing the four feature columns.
/// Other columns are carried through untouched.
pub fn read_csv<R: io::Read>(reader: R) -> Result<CsvBatch, ClientError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut columns = [0usize; NUM_FEATURES];
    for (slot, name) in columns.iter_mut().zip(FEATURE_NAMES) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| ClientError::InvalidInput(format!("CSV is missing column {name:?}")))?;
    }

    let mut records = Vec::new();
    let mut features = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let mut values = [0f64; NUM_FEATURES];
        for ((value, &col), name) in values.iter_mut().zip(&columns).zip(FEATURE_NAMES) {
            let raw = record.get(col).unwrap_or("");
            *value = raw.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                // +2: one for the header, one for 1-based line numbers
                ClientError::InvalidInput(format!(
                    "line {}: {name} is not a number: {raw:?}",
                    row + 2
                ))
            })?;
        }
        features.push(FeatureVector::from(values));
        records.push(record);
    }

    Ok(CsvBatch {
        headers,
        records,
        features,
    })
}

/// Writes the input records with `prediction` and `species` columns appended.
pub fn write_labeled<W: io::Write>(
    batch: &CsvBatch,
    labels: &[Species],
    writer: W,
) -> Result<(), ClientError> {
    if labels.len() != batch.len() {
        return Err(ClientError::InvalidResponse(format!(
            "{} rows but {} predictions",
            batch.len(),
            labels.len()
        )));
    }

    let mut wtr = csv::Writer::from_writer(writer);
    let mut headers = batch.headers.clone();
    headers.push_field("prediction");
    headers.push_field("species");
    wtr.write_record(&headers)?;

    for (record, species) in batch.records.iter().zip(labels) {
        let mut out = record.clone();
        out.push_field(&species.label().to_string());
        out.push_field(species.name());
        wtr.write_record(&out)?;
    }
    wtr.flush()?;
    Ok(())
}
