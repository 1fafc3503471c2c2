use crate::core::dataset::{Dataset, Record};
use crate::core::ports::DataSource;
use crate::core::query::{Query, NATIONS};
use crate::utils::error::{CovidError, Result};
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Columns summed across the four nations to produce the UK series.
pub const UK_TOTAL_COLUMNS: [&str; 11] = [
    "case_newCases",
    "case_cumulativeCases",
    "death_dailyDeaths",
    "death_cumulativeDeaths",
    "hosp_hospitalCases",
    "hosp_newAdmissions",
    "hosp_newAdmissionsChange",
    "hosp_covidOccupiedMVBeds",
    "vac_first_dose",
    "vac_second_dose",
    "vac_total_perc",
];

/// Fetch the four national datasets sequentially and combine them into a
/// single United Kingdom series.
pub async fn fetch_uk(source: &impl DataSource) -> Result<Dataset> {
    let mut datasets = Vec::with_capacity(NATIONS.len());
    for nation in NATIONS {
        tracing::info!(nation, "fetching national dataset");
        let query = Query::national(nation)?;
        datasets.push(source.fetch(&query).await?);
    }
    uk_totals(&datasets)
}

/// Column-wise addition of per-nation datasets. The addition only makes
/// sense when every dataset reports the same date on the same row, so the
/// date sequences are compared position-by-position first and any divergence
/// is an error rather than a silently misaligned total. A null or missing
/// addend makes the whole sum null.
pub fn uk_totals(nations: &[Dataset]) -> Result<Dataset> {
    let first = nations.first().ok_or_else(|| CovidError::InvalidQuery {
        message: "at least one national dataset is required".to_string(),
    })?;

    let reference_dates = first.dates()?;
    for (i, dataset) in nations.iter().enumerate().skip(1) {
        let dates = dataset.dates()?;
        if dates.len() != reference_dates.len() {
            return Err(CovidError::Misaligned {
                message: format!(
                    "dataset 0 has {} rows but dataset {} has {}",
                    reference_dates.len(),
                    i,
                    dates.len()
                ),
            });
        }
        if let Some(row) = dates.iter().zip(&reference_dates).position(|(a, b)| a != b) {
            return Err(CovidError::Misaligned {
                message: format!(
                    "row {}: dataset 0 reports {} but dataset {} reports {}",
                    row, reference_dates[row], i, dates[row]
                ),
            });
        }
    }

    let mut records = Vec::with_capacity(reference_dates.len());
    for (row, date) in reference_dates.iter().enumerate() {
        let mut data = HashMap::new();
        data.insert(
            "date".to_string(),
            Value::String(date.format("%Y-%m-%d").to_string()),
        );
        data.insert(
            "name".to_string(),
            Value::String("United Kingdom".to_string()),
        );
        for column in UK_TOTAL_COLUMNS {
            data.insert(column.to_string(), sum_cell(nations, row, column));
        }
        records.push(Record::from(data));
    }

    let mut columns = vec!["date".to_string(), "name".to_string()];
    columns.extend(UK_TOTAL_COLUMNS.iter().map(|c| c.to_string()));
    Ok(Dataset::new(columns, records))
}

fn sum_cell(nations: &[Dataset], row: usize, column: &str) -> Value {
    let mut total = 0.0;
    for dataset in nations {
        let value = dataset.records()[row].get(column).and_then(Value::as_f64);
        match value {
            Some(v) => total += v,
            None => return Value::Null,
        }
    }
    Number::from_f64(total).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn nation_dataset(name: &str, rows: &[(&str, i64, i64)]) -> Dataset {
        let records = rows
            .iter()
            .map(|(date, cases, deaths)| {
                serde_json::from_value(json!({
                    "date": date,
                    "name": name,
                    "case_newCases": cases,
                    "death_dailyDeaths": deaths,
                }))
                .unwrap()
            })
            .collect();
        Dataset::new(
            vec![
                "date".into(),
                "name".into(),
                "case_newCases".into(),
                "death_dailyDeaths".into(),
            ],
            records,
        )
    }

    #[test]
    fn test_uk_totals_sums_aligned_columns() {
        let nations = vec![
            nation_dataset("england", &[("2021-06-01", 100, 5), ("2021-06-02", 200, 6)]),
            nation_dataset("scotland", &[("2021-06-01", 10, 1), ("2021-06-02", 20, 2)]),
            nation_dataset("wales", &[("2021-06-01", 5, 0), ("2021-06-02", 6, 1)]),
            nation_dataset(
                "northern ireland",
                &[("2021-06-01", 1, 0), ("2021-06-02", 2, 0)],
            ),
        ];

        let uk = uk_totals(&nations).unwrap();

        assert_eq!(uk.len(), 2);
        let first = &uk.records()[0];
        assert_eq!(first.get("name").unwrap(), "United Kingdom");
        assert_eq!(first.get("date").unwrap(), "2021-06-01");
        assert_eq!(first.get("case_newCases").unwrap().as_f64().unwrap(), 116.0);
        assert_eq!(first.get("death_dailyDeaths").unwrap().as_f64().unwrap(), 6.0);
    }

    #[test]
    fn test_uk_totals_rejects_divergent_dates() {
        let nations = vec![
            nation_dataset("england", &[("2021-06-01", 100, 5)]),
            nation_dataset("wales", &[("2021-06-02", 10, 1)]),
        ];

        let err = uk_totals(&nations).unwrap_err();
        assert!(matches!(err, CovidError::Misaligned { .. }));
    }

    #[test]
    fn test_uk_totals_rejects_length_mismatch() {
        let nations = vec![
            nation_dataset("england", &[("2021-06-01", 100, 5), ("2021-06-02", 1, 1)]),
            nation_dataset("wales", &[("2021-06-01", 10, 1)]),
        ];

        let err = uk_totals(&nations).unwrap_err();
        assert!(matches!(err, CovidError::Misaligned { .. }));
    }

    #[test]
    fn test_uk_totals_null_addend_propagates() {
        let with_null: Dataset = Dataset::new(
            vec!["date".into(), "name".into(), "case_newCases".into()],
            vec![serde_json::from_value(
                json!({"date": "2021-06-01", "name": "scotland", "case_newCases": null}),
            )
            .unwrap()],
        );
        let nations = vec![
            nation_dataset("england", &[("2021-06-01", 100, 5)]),
            with_null,
        ];

        let uk = uk_totals(&nations).unwrap();
        assert_eq!(uk.records()[0].get("case_newCases").unwrap(), &Value::Null);
    }

    #[test]
    fn test_uk_totals_requires_at_least_one_dataset() {
        assert!(matches!(
            uk_totals(&[]),
            Err(CovidError::InvalidQuery { .. })
        ));
    }

    struct StubSource;

    #[async_trait]
    impl DataSource for StubSource {
        async fn fetch(&self, query: &Query) -> Result<Dataset> {
            // One row per nation, all on the same date.
            let name = query
                .filter_string()
                .split("areaName=")
                .nth(1)
                .unwrap_or("unknown")
                .to_string();
            Ok(nation_dataset(&name, &[("2021-06-01", 10, 1)]))
        }
    }

    #[tokio::test]
    async fn test_fetch_uk_combines_four_nations() {
        let uk = fetch_uk(&StubSource).await.unwrap();
        assert_eq!(uk.len(), 1);
        assert_eq!(
            uk.records()[0].get("case_newCases").unwrap().as_f64().unwrap(),
            40.0
        );
    }
}
