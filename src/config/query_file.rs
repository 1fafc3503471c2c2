use crate::core::query::{AreaType, Field, FieldMap, FieldSource, Query};
use crate::utils::error::{CovidError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A query definition supplied by the caller as TOML, decoupling the fetch
/// mechanism from the built-in field tables. Fields are an ordered array of
/// tables so the declared column order survives parsing:
///
/// ```toml
/// area_type = "nation"
/// area_name = "wales"
///
/// [[field]]
/// name = "date"
/// source = "date"
///
/// [[field]]
/// name = "case_newCases"
/// source = "newCasesByPublishDate"
/// ```
///
/// An entry may carry a `nested` table instead of `source` for demographic
/// breakdowns. An empty field list falls back to the default table for the
/// area type.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryFile {
    pub area_type: String,
    pub area_name: Option<String>,
    pub date: Option<String>,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub source: Option<String>,
    pub nested: Option<BTreeMap<String, String>>,
}

impl QueryFile {
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CovidError::Config {
            message: format!("invalid query file: {}", e),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn into_query(self) -> Result<Query> {
        let area_type: AreaType = self.area_type.parse()?;

        let fields = if self.fields.is_empty() {
            default_field_map(area_type)
        } else {
            let mut map = FieldMap::new();
            for entry in self.fields {
                let source = match (entry.source, entry.nested) {
                    (Some(path), None) => FieldSource::Path(path),
                    (None, Some(nested)) => {
                        FieldSource::Nested(nested.into_iter().collect())
                    }
                    _ => {
                        return Err(CovidError::Config {
                            message: format!(
                                "field {:?} must have exactly one of `source` or `nested`",
                                entry.name
                            ),
                        })
                    }
                };
                map.push(Field {
                    name: entry.name,
                    source,
                });
            }
            map
        };

        let mut query = Query::new(area_type, fields);
        if let Some(name) = self.area_name {
            query = query.with_area_name(&name);
        }
        if let Some(date) = self.date {
            query = query.with_date(&date);
        }
        query.validate()?;
        Ok(query)
    }
}

fn default_field_map(area_type: AreaType) -> FieldMap {
    match area_type {
        AreaType::Nation => FieldMap::national(),
        AreaType::Region => FieldMap::regional(),
        _ => FieldMap::local(),
    }
}
