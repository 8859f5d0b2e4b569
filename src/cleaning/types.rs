//! Core data types for the cleaning pipeline

use crate::error::{CleaningError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;

pub const PRICE: &str = "price";
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";
pub const LAST_REVIEW: &str = "last_review";

/// One typed column of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Number(Vec<Option<f64>>),
    Text(Vec<String>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Number(values) => values.len(),
            Column::Text(values) => values.len(),
            Column::Timestamp(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numbers(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Number(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Column::Text(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_timestamps(&self) -> Option<&[Option<NaiveDateTime>]> {
        match self {
            Column::Timestamp(values) => Some(values),
            _ => None,
        }
    }

    fn retain(&mut self, keep: &[bool]) {
        fn apply<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            values.retain(|_| *flags.next().unwrap_or(&false));
        }

        match self {
            Column::Number(values) => apply(values, keep),
            Column::Text(values) => apply(values, keep),
            Column::Timestamp(values) => apply(values, keep),
        }
    }
}

/// Ordered collection of named, equally long columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Every column must have the same length.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.index_of(&name).is_some() {
            return Err(CleaningError::MalformedInput {
                path: Path::new("<memory>").to_path_buf(),
                message: format!("duplicate column '{}'", name),
            });
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(CleaningError::MalformedInput {
                path: Path::new("<memory>").to_path_buf(),
                message: format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    column.len(),
                    self.n_rows()
                ),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_columns())
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index_of(name).map(|idx| &self.columns[idx])
    }

    /// Swap a column's values in place, keeping its name and position.
    pub fn replace_column(&mut self, name: &str, column: Column) -> Option<Column> {
        let idx = self.index_of(name)?;
        if column.len() != self.n_rows() {
            return None;
        }
        Some(std::mem::replace(&mut self.columns[idx], column))
    }

    /// Keep the rows whose mask entry is true.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            column.retain(keep);
        }
    }

    /// Names match ignoring surrounding whitespace
    fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.names.iter().position(|n| n.trim() == name)
    }
}

/// Storage type a required column must have after loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Number,
    Text,
}

/// Columns the cleaner depends on; all others pass through as text
#[derive(Debug, Clone)]
pub struct Schema {
    pub required: Vec<(&'static str, ColumnKind)>,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            required: vec![
                (PRICE, ColumnKind::Number),
                (LONGITUDE, ColumnKind::Number),
                (LATITUDE, ColumnKind::Number),
                (LAST_REVIEW, ColumnKind::Text),
            ],
        }
    }
}

impl Schema {
    pub fn kind_of(&self, name: &str) -> ColumnKind {
        self.required
            .iter()
            .find(|(required, _)| *required == name)
            .map(|(_, kind)| *kind)
            .unwrap_or(ColumnKind::Text)
    }

    pub fn validate_header(&self, header: &[String], path: &Path) -> Result<()> {
        for (name, _) in &self.required {
            if !header.iter().any(|h| h == name) {
                return Err(CleaningError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Closed price interval [min, max]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CleaningError::InvalidBounds { min, max });
        }
        Ok(PriceRange { min, max })
    }

    pub fn contains(&self, price: f64) -> bool {
        crate::in_closed_range(price, self.min, self.max)
    }
}

/// Longitude/latitude rectangle of serviceable listings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

impl BoundingBox {
    /// New York City, Staten Island to Queens and up to the Bronx
    pub const NYC: BoundingBox = BoundingBox {
        min_longitude: -74.25,
        max_longitude: -73.50,
        min_latitude: 40.5,
        max_latitude: 41.2,
    };

    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        crate::in_closed_range(longitude, self.min_longitude, self.max_longitude)
            && crate::in_closed_range(latitude, self.min_latitude, self.max_latitude)
    }
}

/// Everything the cleaning functions need, passed explicitly
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CleaningConfig {
    pub price: PriceRange,
    pub bbox: BoundingBox,
}

impl CleaningConfig {
    pub fn new(min_price: f64, max_price: f64) -> Result<Self> {
        Ok(CleaningConfig {
            price: PriceRange::new(min_price, max_price)?,
            bbox: BoundingBox::NYC,
        })
    }
}

/// Row counts through the pipeline
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub input_rows: usize,
    pub after_price: usize,
    pub after_geo: usize,
    pub unparsed_dates: usize,
}

impl CleanStats {
    pub fn dropped(&self) -> usize {
        self.input_rows - self.after_geo
    }
}

impl std::fmt::Display for CleanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "input: {}, after price: {}, after geo: {}, unparsed dates: {}",
            self.input_rows, self.after_price, self.after_geo, self.unparsed_dates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.push_column("id", Column::Text(vec!["1".into(), "2".into(), "3".into()]))
            .unwrap();
        ds.push_column(PRICE, Column::Number(vec![Some(50.0), None, Some(10.0)]))
            .unwrap();
        ds
    }

    #[test]
    fn test_shape_and_retain() {
        let mut ds = sample();
        assert_eq!(ds.shape(), (3, 2));

        ds.retain_rows(&[true, false, true]);
        assert_eq!(ds.shape(), (2, 2));
        assert_eq!(
            ds.column("id").unwrap().as_text().unwrap(),
            &["1".to_string(), "3".to_string()]
        );
        assert_eq!(
            ds.column(PRICE).unwrap().as_numbers().unwrap(),
            &[Some(50.0), Some(10.0)]
        );
    }

    #[test]
    fn test_push_column_rejects_mismatch() {
        let mut ds = sample();
        let result = ds.push_column("extra", Column::Text(vec!["x".into()]));
        assert!(matches!(result, Err(CleaningError::MalformedInput { .. })));

        let result = ds.push_column("id", Column::Text(vec![String::new(); 3]));
        assert!(result.is_err());
    }

    #[test]
    fn test_replace_column_keeps_position() {
        let mut ds = sample();
        let old = ds.replace_column("id", Column::Timestamp(vec![None, None, None]));
        assert!(old.is_some());
        assert_eq!(ds.column_names(), &["id".to_string(), PRICE.to_string()]);
        assert!(ds.column("id").unwrap().as_timestamps().is_some());

        assert!(ds.replace_column("missing", Column::Text(vec![])).is_none());
    }

    #[test]
    fn test_price_range_validation() {
        assert!(PriceRange::new(10.0, 1000.0).is_ok());
        assert!(PriceRange::new(10.0, 10.0).is_ok());
        assert!(matches!(
            PriceRange::new(1000.0, 10.0),
            Err(CleaningError::InvalidBounds { .. })
        ));
        assert!(PriceRange::new(f64::NAN, 10.0).is_err());
        assert!(PriceRange::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_bounding_box_edges() {
        let bbox = BoundingBox::NYC;
        assert!(bbox.contains(-73.9, 40.7));
        assert!(bbox.contains(-74.25, 40.5));
        assert!(bbox.contains(-73.50, 41.2));
        assert!(!bbox.contains(-75.0, 40.7));
        assert!(!bbox.contains(-73.9, 41.3));
    }

    #[test]
    fn test_schema_validation() {
        let schema = Schema::default();
        let header: Vec<String> = ["id", "price", "longitude", "latitude", "last_review"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(schema.validate_header(&header, Path::new("x.csv")).is_ok());

        let result = schema.validate_header(&header[..4], Path::new("x.csv"));
        match result {
            Err(CleaningError::MissingColumn { column, .. }) => assert_eq!(column, "last_review"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }

        assert_eq!(schema.kind_of("price"), ColumnKind::Number);
        assert_eq!(schema.kind_of("name"), ColumnKind::Text);
    }

    #[test]
    fn test_stats_display() {
        let stats = CleanStats {
            input_rows: 10,
            after_price: 8,
            after_geo: 7,
            unparsed_dates: 2,
        };
        assert_eq!(stats.dropped(), 3);
        assert_eq!(
            stats.to_string(),
            "input: 10, after price: 8, after geo: 7, unparsed dates: 2"
        );
    }
}
