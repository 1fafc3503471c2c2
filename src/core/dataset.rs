use crate::utils::error::{CovidError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One logical data row (e.g., one nation-day) as returned by the API.
/// Values are scalars or nested sequences of sub-records (demographic
/// breakdowns); no schema is enforced beyond what the remote returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }
}

impl From<HashMap<String, Value>> for Record {
    fn from(data: HashMap<String, Value>) -> Self {
        Self { data }
    }
}

/// The ordered concatenation of all records across all pages for one query,
/// with the column order taken from the query's field map. Built fresh per
/// fetch and handed to downstream consumers as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one column in record order; absent fields read as None.
    pub fn column(&self, name: &str) -> Vec<Option<&Value>> {
        self.records.iter().map(|r| r.get(name)).collect()
    }

    /// The parsed `date` column, in record order. Combining datasets relies
    /// on this; a missing or unparseable date is a malformed response.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let raw = record
                    .get("date")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CovidError::MalformedResponse {
                        message: format!("record {} has no string `date` field", i),
                    })?;
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                    CovidError::MalformedResponse {
                        message: format!("record {} has unparseable date {:?}: {}", i, raw, e),
                    }
                })
            })
            .collect()
    }

    /// Render the dataset as CSV with columns in field-map order. Scalars are
    /// written verbatim, nulls as empty cells, and nested demographic values
    /// as compact JSON strings; flattening them is a presentation concern.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;

        for record in &self.records {
            let mut row = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                let cell = match record.get(column) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(nested) => serde_json::to_string(nested)?,
                };
                row.push(cell);
            }
            writer.write_record(&row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CovidError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| {
            CovidError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}
