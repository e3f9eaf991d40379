//! Bounding-box search over stored business coordinates.
//!
//! A linear scan of every stored document. There is no spatial tree, which is
//! fine for city-sized collections and scales linearly with corpus size.

use crate::document::BusinessDocument;
use crate::error::{Error, Result};
use crate::store::Index;

/// Absolute tolerance absorbing float round-trip error from storage.
pub const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl BoundingBox {
    /// Rejects boxes outside `[-90, 90] x [-180, 180]`, inverted ranges, and NaN.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Result<Self> {
        let invalid = |reason: &'static str| Error::InvalidBounds { lat_min, lat_max, lon_min, lon_max, reason };
        if [lat_min, lat_max, lon_min, lon_max].iter().any(|v| v.is_nan()) {
            return Err(invalid("coordinates must be numbers"));
        }
        if !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
            return Err(invalid("latitude must be between -90 and 90"));
        }
        if !(-180.0..=180.0).contains(&lon_min) || !(-180.0..=180.0).contains(&lon_max) {
            return Err(invalid("longitude must be between -180 and 180"));
        }
        if lat_min > lat_max || lon_min > lon_max {
            return Err(invalid("minimum must be less than or equal to maximum"));
        }
        Ok(Self { lat_min, lat_max, lon_min, lon_max })
    }

    /// Smallest box enclosing every point, or `None` for no points.
    pub fn enclosing<I>(points: I) -> Option<Result<Self>>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (lat, lon) = iter.next()?;
        let (mut lat_min, mut lat_max, mut lon_min, mut lon_max) = (lat, lat, lon, lon);
        for (lat, lon) in iter {
            lat_min = lat_min.min(lat);
            lat_max = lat_max.max(lat);
            lon_min = lon_min.min(lon);
            lon_max = lon_max.max(lon);
        }
        Some(Self::new(lat_min, lat_max, lon_min, lon_max))
    }

    pub fn lat_min(&self) -> f64 { self.lat_min }
    pub fn lat_max(&self) -> f64 { self.lat_max }
    pub fn lon_min(&self) -> f64 { self.lon_min }
    pub fn lon_max(&self) -> f64 { self.lon_max }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.lat_min - EPSILON <= latitude
            && latitude <= self.lat_max + EPSILON
            && self.lon_min - EPSILON <= longitude
            && longitude <= self.lon_max + EPSILON
    }
}

/// Every business inside `bounds`, in document id order.
pub fn within<'a>(index: &'a Index<BusinessDocument>, bounds: &BoundingBox) -> Vec<&'a BusinessDocument> {
    let hits: Vec<&BusinessDocument> =
        index.documents().map(|(_, doc)| doc).filter(|doc| bounds.contains(doc.latitude, doc.longitude)).collect();
    tracing::debug!(scanned = index.len(), total_hits = hits.len(), ?bounds, "geospatial scan");
    hits
}
