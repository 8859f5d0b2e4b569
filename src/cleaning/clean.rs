//! Cleaning functions - row filters and type coercion over a Dataset
//! Pure functions - no I/O besides logging

use crate::cleaning::parse::coerce_timestamps;
use crate::cleaning::types::{
    BoundingBox, CleanStats, CleaningConfig, Column, Dataset, PriceRange, LAST_REVIEW, LATITUDE,
    LONGITUDE, PRICE,
};
use crate::error::{CleaningError, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Run every cleaning rule in order: price, last_review, geography
pub fn clean(dataset: Dataset, config: &CleaningConfig) -> Result<(Dataset, CleanStats)> {
    let mut stats = CleanStats {
        input_rows: dataset.n_rows(),
        ..CleanStats::default()
    };

    info!(
        "Dropping price outliers outside range [{}, {}]",
        config.price.min, config.price.max
    );
    let dataset = filter_price(dataset, &config.price)?;
    stats.after_price = dataset.n_rows();
    info!("Data shape after price filtering: {:?}", dataset.shape());

    info!("Converting {} to datetime", LAST_REVIEW);
    let (dataset, unparsed) = normalize_last_review(dataset)?;
    stats.unparsed_dates = unparsed;

    info!("Filtering geographic outliers");
    let dataset = filter_geography(dataset, &config.bbox)?;
    stats.after_geo = dataset.n_rows();
    info!("Data shape after geographic filtering: {:?}", dataset.shape());

    Ok((dataset, stats))
}

/// Keep rows whose price lies in the closed range. Null prices are dropped.
pub fn filter_price(mut dataset: Dataset, range: &PriceRange) -> Result<Dataset> {
    let keep: Vec<bool> = numbers(&dataset, PRICE)?
        .iter()
        .map(|price| price.map(|p| range.contains(p)).unwrap_or(false))
        .collect();

    debug!(
        "Price filter keeps {} of {} rows",
        keep.iter().filter(|k| **k).count(),
        keep.len()
    );
    dataset.retain_rows(&keep);
    Ok(dataset)
}

/// Keep rows inside the bounding box. Null coordinates are dropped.
pub fn filter_geography(mut dataset: Dataset, bbox: &BoundingBox) -> Result<Dataset> {
    let longitudes = numbers(&dataset, LONGITUDE)?;
    let latitudes = numbers(&dataset, LATITUDE)?;

    let keep: Vec<bool> = longitudes
        .iter()
        .zip(latitudes.iter())
        .map(|coords| match coords {
            (Some(lon), Some(lat)) => bbox.contains(*lon, *lat),
            _ => false,
        })
        .collect();

    debug!(
        "Geographic filter keeps {} of {} rows",
        keep.iter().filter(|k| **k).count(),
        keep.len()
    );
    dataset.retain_rows(&keep);
    Ok(dataset)
}

/// Turn `last_review` into a timestamp column. Already-converted columns are
/// left as they are, so cleaning twice gives the same result.
/// Returns the number of values that could not be parsed.
pub fn normalize_last_review(mut dataset: Dataset) -> Result<(Dataset, usize)> {
    let column = dataset
        .column(LAST_REVIEW)
        .ok_or_else(|| missing(LAST_REVIEW))?;

    let (coerced, failures) = match column {
        Column::Timestamp(_) => return Ok((dataset, 0)),
        Column::Text(values) => coerce_timestamps(values, LAST_REVIEW),
        Column::Number(_) => {
            return Err(CleaningError::MalformedInput {
                path: PathBuf::from("<memory>"),
                message: format!("column '{}' is numeric", LAST_REVIEW),
            })
        }
    };

    dataset.replace_column(LAST_REVIEW, coerced);
    Ok((dataset, failures))
}

fn numbers<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [Option<f64>]> {
    dataset
        .column(name)
        .ok_or_else(|| missing(name))?
        .as_numbers()
        .ok_or_else(|| CleaningError::MalformedInput {
            path: PathBuf::from("<memory>"),
            message: format!("column '{}' is not numeric", name),
        })
}

fn missing(name: &str) -> CleaningError {
    CleaningError::MissingColumn {
        path: PathBuf::from("<memory>"),
        column: name.to_string(),
    }
}
