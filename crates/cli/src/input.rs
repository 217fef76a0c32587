//! Input file parsing

use anyhow::{Context, Result};
use forecast_lib::{DatedValue, Observation};
use serde::Deserialize;
use std::path::Path;

/// Point file: a bare array of `{x, y}` or the regression request shape `{data: [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum PointsFile {
    Bare(Vec<Observation>),
    Wrapped { data: Vec<Observation> },
}

/// A series read from disk, with or without dates
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Series {
    Dated(Vec<DatedValue>),
    Plain(Vec<f64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesFile {
    Bare(Series),
    #[serde(rename_all = "camelCase")]
    Wrapped { historical_data: Series },
}

impl Series {
    /// Values in chronological order
    pub fn values(&self) -> Vec<f64> {
        match self {
            Series::Dated(points) => {
                let mut ordered = points.clone();
                ordered.sort_by_key(|p| p.date);
                ordered.iter().map(|p| p.value).collect()
            }
            Series::Plain(values) => values.clone(),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn read_points(path: &Path) -> Result<Vec<Observation>> {
    let file: PointsFile = serde_json::from_str(&read(path)?)
        .with_context(|| format!("{} is not an array of {{x, y}} points", path.display()))?;
    Ok(match file {
        PointsFile::Bare(points) | PointsFile::Wrapped { data: points } => points,
    })
}

pub fn read_series(path: &Path) -> Result<Series> {
    let file: SeriesFile = serde_json::from_str(&read(path)?).with_context(|| {
        format!(
            "{} is not an array of numbers or {{date, value}} points",
            path.display()
        )
    })?;
    Ok(match file {
        SeriesFile::Bare(series) | SeriesFile::Wrapped { historical_data: series } => series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn write(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("input.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_points_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let bare = read_points(&write(&dir, r#"[{"x": 1, "y": 2}]"#)).unwrap();
        assert_eq!(bare, vec![Observation::new(1.0, 2.0)]);

        let wrapped = read_points(&write(&dir, r#"{"data": [{"x": 1, "y": 2}], "type": "linear"}"#)).unwrap();
        assert_eq!(wrapped, bare);
    }

    #[test]
    fn test_plain_series() {
        let dir = tempfile::tempdir().unwrap();
        let series = read_series(&write(&dir, "[1, 2.5, 3]")).unwrap();
        assert_eq!(series, Series::Plain(vec![1.0, 2.5, 3.0]));
    }

    #[test]
    fn test_dated_series() {
        let dir = tempfile::tempdir().unwrap();
        let series = read_series(&write(
            &dir,
            r#"{"historicalData": [{"date": "2024-02-28", "value": 4}]}"#,
        ))
        .unwrap();
        assert_eq!(
            series,
            Series::Dated(vec![DatedValue::new(
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                4.0
            )])
        );
        assert_eq!(series.values(), vec![4.0]);
    }

    #[test]
    fn test_bad_series() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_series(&write(&dir, r#"[{"when": "today"}]"#)).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }
}
