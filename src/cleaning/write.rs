//! Write functions - persist a Dataset as CSV

use crate::cleaning::types::{Column, Dataset};
use crate::error::Result;
use chrono::{NaiveDateTime, NaiveTime};
use std::path::Path;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write the dataset with a header row and one record per line
pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    info!("Saving {} rows to {:?}", dataset.n_rows(), path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(dataset.column_names())?;

    let cells: Vec<Vec<String>> = dataset
        .columns()
        .map(|(_, column)| format_column(column))
        .collect();

    for row in 0..dataset.n_rows() {
        writer.write_record(cells.iter().map(|column| column[row].as_str()))?;
    }

    writer.flush()?;
    Ok(())
}

/// Render every cell of a column. Nulls become empty cells.
fn format_column(column: &Column) -> Vec<String> {
    match column {
        Column::Number(values) => values
            .iter()
            .map(|v| v.map(format_number).unwrap_or_default())
            .collect(),
        Column::Text(values) => values.clone(),
        Column::Timestamp(values) => {
            // Date-only output when no value carries a time of day
            let format = if values.iter().flatten().all(is_midnight) {
                DATE_FORMAT
            } else {
                DATETIME_FORMAT
            };
            values
                .iter()
                .map(|v| v.map(|ts| ts.format(format).to_string()).unwrap_or_default())
                .collect()
        }
    }
}

/// Shortest round-tripping form: 50.0 -> "50", -73.94190 -> "-73.9419"
pub fn format_number(value: f64) -> String {
    value.to_string()
}

fn is_midnight(ts: &NaiveDateTime) -> bool {
    ts.time() == NaiveTime::MIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::parse::read_dataset;
    use crate::cleaning::types::Schema;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(-73.9419), "-73.9419");
        assert_eq!(format_number(40.5), "40.5");
    }

    #[test]
    fn test_write_dates_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut ds = Dataset::new();
        ds.push_column("name", Column::Text(vec!["Loft, big".into(), "Room".into()]))
            .unwrap();
        ds.push_column("price", Column::Number(vec![Some(50.0), Some(120.5)]))
            .unwrap();
        ds.push_column("last_review", Column::Timestamp(vec![ts(2019, 5, 21, 0), None]))
            .unwrap();

        write_dataset(&ds, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "name,price,last_review\n\"Loft, big\",50,2019-05-21\nRoom,120.5,\n"
        );
    }

    #[test]
    fn test_write_datetimes_when_time_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let mut ds = Dataset::new();
        ds.push_column(
            "last_review",
            Column::Timestamp(vec![ts(2019, 5, 21, 0), ts(2019, 5, 22, 14)]),
        )
        .unwrap();

        write_dataset(&ds, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "last_review\n2019-05-21 00:00:00\n2019-05-22 14:00:00\n"
        );
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut ds = Dataset::new();
        ds.push_column("price", Column::Number(vec![Some(75.0)])).unwrap();
        ds.push_column("longitude", Column::Number(vec![Some(-73.95)])).unwrap();
        ds.push_column("latitude", Column::Number(vec![Some(40.72)])).unwrap();
        ds.push_column("last_review", Column::Timestamp(vec![ts(2020, 1, 2, 0)]))
            .unwrap();
        write_dataset(&ds, &path).unwrap();

        let loaded = read_dataset(&path, &Schema::default()).unwrap();
        assert_eq!(loaded.shape(), ds.shape());
        assert_eq!(
            loaded.column("last_review").unwrap().as_text().unwrap(),
            &["2020-01-02".to_string()]
        );
    }
}
