use crate::utils::error::{CovidError, Result};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Default endpoint of the gov.uk coronavirus API.
pub const ENDPOINT: &str = "https://api.coronavirus.data.gov.uk/v1/data";

pub const NATIONS: [&str; 4] = ["england", "scotland", "wales", "northern ireland"];

pub const REGIONS: [&str; 9] = [
    "East Midlands",
    "East of England",
    "London",
    "North East",
    "North West",
    "South East",
    "South West",
    "West Midlands",
    "Yorkshire and The Humber",
];

/// Area designations accepted by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaType {
    Nation,
    Region,
    Ltla,
    Utla,
    Overview,
    NhsRegion,
}

impl AreaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::Nation => "nation",
            AreaType::Region => "region",
            AreaType::Ltla => "ltla",
            AreaType::Utla => "utla",
            AreaType::Overview => "overview",
            AreaType::NhsRegion => "nhsRegion",
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AreaType {
    type Err = CovidError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nation" => Ok(AreaType::Nation),
            "region" => Ok(AreaType::Region),
            "ltla" => Ok(AreaType::Ltla),
            "utla" => Ok(AreaType::Utla),
            "overview" => Ok(AreaType::Overview),
            "nhsRegion" => Ok(AreaType::NhsRegion),
            other => Err(CovidError::InvalidQuery {
                message: format!("unsupported area type: {:?}", other),
            }),
        }
    }
}

/// Where an output column comes from on the upstream side: either a plain
/// metric name, or a nested mapping for demographic breakdowns.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    Path(String),
    Nested(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub source: FieldSource,
}

/// Ordered mapping from output column names to upstream field paths. The
/// declaration order drives the column order of the resulting dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap {
    fields: Vec<Field>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with(mut self, name: &str, path: &str) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            source: FieldSource::Path(path.to_string()),
        });
        self
    }

    pub fn with_nested(mut self, name: &str, entries: &[(&str, &str)]) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            source: FieldSource::Nested(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        });
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Render the map as the compact JSON object the API expects in its
    /// `structure` query parameter.
    pub fn to_structure_json(&self) -> Result<String> {
        let mut object = Map::new();
        for field in &self.fields {
            let value = match &field.source {
                FieldSource::Path(path) => Value::String(path.clone()),
                FieldSource::Nested(entries) => {
                    let mut nested = Map::new();
                    for (name, path) in entries {
                        nested.insert(name.clone(), Value::String(path.clone()));
                    }
                    Value::Object(nested)
                }
            };
            object.insert(field.name.clone(), value);
        }
        let json = serde_json::to_string(&Value::Object(object))?;
        Ok(json)
    }

    /// Default column table for national queries. Column names are a contract
    /// with downstream plotting consumers and must not be renamed.
    pub fn national() -> Self {
        FieldMap::new()
            .with("date", "date")
            .with("name", "areaName")
            .with("case_newCases", "newCasesByPublishDate")
            .with("case_newCasesChange", "newCasesByPublishDateChange")
            .with("case_newCasesPercChange", "newCasesByPublishDateChangePercentage")
            .with("case_rate", "newCasesBySpecimenDateRollingRate")
            .with("case_cumulativeCases", "cumCasesByPublishDate")
            .with("death_dailyDeaths", "newDeaths28DaysByPublishDate")
            .with("death_newDeathRate", "newDeaths28DaysByDeathDateRate")
            .with("death_cumulativeDeaths", "cumDeaths28DaysByDeathDate")
            .with("death_cumulativeDeathsRate", "cumDeaths28DaysByDeathDateRate")
            .with("death_Demographics", "newDeaths28DaysByDeathDateAgeDemographics")
            .with("vac_first_dose", "cumPeopleVaccinatedFirstDoseByVaccinationDate")
            .with("vac_second_dose", "cumPeopleVaccinatedSecondDoseByPublishDate")
            .with(
                "vac_total_perc",
                "cumVaccinationCompleteCoverageByVaccinationDatePercentage",
            )
            .with("vac_demographics", "vaccinationsAgeDemographics")
            .with("hosp_hospitalCases", "hospitalCases")
            .with("hosp_newAdmissions", "newAdmissions")
            .with("hosp_newAdmissionsChange", "newAdmissionsChange")
            .with("hosp_covidOccupiedMVBeds", "covidOccupiedMVBeds")
    }

    /// Default column table for the nine English regions.
    pub fn regional() -> Self {
        FieldMap::new()
            .with("date", "date")
            .with("name", "areaName")
            .with("cases_newDaily", "newCasesBySpecimenDate")
            .with("cases_cumulative", "cumCasesBySpecimenDate")
            .with("case_rate", "newCasesBySpecimenDateRollingRate")
            .with("cases_demographics", "newCasesBySpecimenDateAgeDemographics")
            .with("death_newDeathRate", "newDeaths28DaysByDeathDateRate")
            .with("death_cumulativeDeaths", "cumDeaths28DaysByDeathDate")
            .with("death_cumulativeDeathsRate", "cumDeaths28DaysByDeathDateRate")
            .with("death_Demographics", "newDeaths28DaysByDeathDateAgeDemographics")
            .with(
                "vac_firstDose",
                "cumVaccinationFirstDoseUptakeByVaccinationDatePercentage",
            )
            .with(
                "vac_secondDose",
                "cumVaccinationSecondDoseUptakeByVaccinationDatePercentage",
            )
            .with("vac_demographics", "vaccinationsAgeDemographics")
    }

    /// Default column table for lower-tier local authorities.
    pub fn local() -> Self {
        FieldMap::new()
            .with("date", "date")
            .with("name", "areaName")
            .with("case_newDaily", "newCasesByPublishDate")
            .with("case_cumulative", "cumCasesBySpecimenDate")
            .with("case_rate", "newCasesBySpecimenDateRollingRate")
    }
}

/// One logical request against the API: area predicates plus the field map
/// that shapes the records coming back. Immutable once built; `PagedFetcher`
/// turns it into the `filters`/`structure`/`page` wire parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    area_type: AreaType,
    area_name: Option<String>,
    date: Option<String>,
    fields: FieldMap,
}

impl Query {
    pub fn new(area_type: AreaType, fields: FieldMap) -> Self {
        Self {
            area_type,
            area_name: None,
            date: None,
            fields,
        }
    }

    pub fn with_area_name(mut self, name: &str) -> Self {
        self.area_name = Some(name.to_string());
        self
    }

    pub fn with_date(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    /// National query for one of the four UK nations, with the default
    /// national field map. The nation name is matched case-insensitively and
    /// lowercased on the wire.
    pub fn national(nation: &str) -> Result<Self> {
        let nation = nation.to_lowercase();
        if !NATIONS.contains(&nation.as_str()) {
            return Err(CovidError::InvalidQuery {
                message: format!(
                    "nation must be one of {}, got {:?}",
                    NATIONS.join(", "),
                    nation
                ),
            });
        }
        Ok(Query::new(AreaType::Nation, FieldMap::national()).with_area_name(&nation))
    }

    /// Regional query covering the nine English regions. Regional data is not
    /// published for the other UK countries, so no area name is applied.
    pub fn regional() -> Self {
        Query::new(AreaType::Region, FieldMap::regional())
    }

    /// Local-authority query, optionally restricted to a single ISO date.
    pub fn local(date: Option<&str>) -> Result<Self> {
        let query = Query::new(AreaType::Ltla, FieldMap::local());
        match date {
            Some(date) => {
                let query = query.with_date(date);
                query.validate()?;
                Ok(query)
            }
            None => Ok(query),
        }
    }

    pub fn area_type(&self) -> AreaType {
        self.area_type
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.fields
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.column_names()
    }

    /// Check the query before any network round-trip.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(CovidError::InvalidQuery {
                message: "field map must contain at least one column".to_string(),
            });
        }

        if let Some(name) = &self.area_name {
            match self.area_type {
                AreaType::Nation => {
                    if !NATIONS.contains(&name.to_lowercase().as_str()) {
                        return Err(CovidError::InvalidQuery {
                            message: format!("unknown nation: {:?}", name),
                        });
                    }
                }
                AreaType::Region => {
                    if !REGIONS.iter().any(|r| r.eq_ignore_ascii_case(name)) {
                        return Err(CovidError::InvalidQuery {
                            message: format!("unknown region: {:?}", name),
                        });
                    }
                }
                _ => {
                    if name.trim().is_empty() {
                        return Err(CovidError::InvalidQuery {
                            message: "area name cannot be empty".to_string(),
                        });
                    }
                }
            }
        }

        if let Some(date) = &self.date {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(CovidError::InvalidQuery {
                    message: format!("date filter must be YYYY-MM-DD, got {:?}", date),
                });
            }
        }

        Ok(())
    }

    /// Semicolon-joined conjunction of equality predicates, in the fixed
    /// order areaType, areaName, date. The order and joiner are part of the
    /// wire contract.
    pub fn filter_string(&self) -> String {
        let mut filters = vec![format!("areaType={}", self.area_type)];
        if let Some(name) = &self.area_name {
            filters.push(format!("areaName={}", name));
        }
        if let Some(date) = &self.date {
            filters.push(format!("date={}", date));
        }
        filters.join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_string_nation_and_name() {
        let query = Query::national("wales").unwrap();
        assert_eq!(query.filter_string(), "areaType=nation;areaName=wales");
    }

    #[test]
    fn test_filter_string_includes_date() {
        let query = Query::new(AreaType::Ltla, FieldMap::local()).with_date("2021-06-01");
        assert_eq!(query.filter_string(), "areaType=ltla;date=2021-06-01");
    }

    #[test]
    fn test_national_rejects_unknown_nation() {
        let err = Query::national("france").unwrap_err();
        assert!(matches!(err, CovidError::InvalidQuery { .. }));
    }

    #[test]
    fn test_national_lowercases_nation() {
        let query = Query::national("Northern Ireland").unwrap();
        assert_eq!(
            query.filter_string(),
            "areaType=nation;areaName=northern ireland"
        );
    }

    #[test]
    fn test_validate_rejects_empty_field_map() {
        let query = Query::new(AreaType::Nation, FieldMap::new());
        assert!(matches!(
            query.validate(),
            Err(CovidError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let query = Query::new(AreaType::Ltla, FieldMap::local()).with_date("June 1st");
        assert!(matches!(
            query.validate(),
            Err(CovidError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_region() {
        let query = Query::regional().with_area_name("Atlantis");
        assert!(matches!(
            query.validate(),
            Err(CovidError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_area_type_round_trip() {
        for s in ["nation", "region", "ltla", "utla", "overview", "nhsRegion"] {
            assert_eq!(s.parse::<AreaType>().unwrap().as_str(), s);
        }
        assert!("continent".parse::<AreaType>().is_err());
    }

    #[test]
    fn test_national_field_map_preserves_contract_names() {
        let columns = FieldMap::national().column_names();
        assert_eq!(columns.len(), 20);
        assert_eq!(columns[0], "date");
        assert!(columns.contains(&"case_newCases".to_string()));
        assert!(columns.contains(&"death_cumulativeDeaths".to_string()));
        assert!(columns.contains(&"vac_first_dose".to_string()));
        assert!(columns.contains(&"hosp_covidOccupiedMVBeds".to_string()));
    }

    #[test]
    fn test_structure_json_scalar_and_nested() {
        let map = FieldMap::new()
            .with("date", "date")
            .with_nested("ages", &[("age", "age"), ("deaths", "deaths")]);
        let json: serde_json::Value =
            serde_json::from_str(&map.to_structure_json().unwrap()).unwrap();
        assert_eq!(json["date"], "date");
        assert_eq!(json["ages"]["age"], "age");
        assert_eq!(json["ages"]["deaths"], "deaths");
    }

    #[test]
    fn test_local_query_with_optional_date() {
        let query = Query::local(Some("2021-01-15")).unwrap();
        assert_eq!(query.filter_string(), "areaType=ltla;date=2021-01-15");

        let query = Query::local(None).unwrap();
        assert_eq!(query.filter_string(), "areaType=ltla");

        assert!(Query::local(Some("not-a-date")).is_err());
    }
}
