//! The three query operations, each over an explicitly opened index handle.

use crate::document::{BusinessDocument, BusinessField, ReviewDocument, ReviewField};
use crate::error::Result;
use crate::geo::{self, BoundingBox};
use crate::query::QueryEngine;
use crate::ranker::{rank_businesses, rank_reviews, BusinessSort, Ranked, ReviewSort};
use crate::store::Index;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessHit {
    pub business_id: String,
    pub name: String,
    pub stars: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewHit {
    pub review_id: String,
    pub text: String,
    pub stars: f64,
    pub useful: i64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoHit {
    pub business_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stars: f64,
}

impl From<&BusinessDocument> for BusinessHit {
    fn from(d: &BusinessDocument) -> Self {
        Self { business_id: d.business_id.clone(), name: d.name.clone(), stars: d.stars }
    }
}

impl From<&ReviewDocument> for ReviewHit {
    fn from(d: &ReviewDocument) -> Self {
        Self {
            review_id: d.review_id.clone(),
            text: d.text.clone(),
            stars: d.stars,
            useful: d.useful,
            date: d.date.clone(),
        }
    }
}

impl From<&BusinessDocument> for GeoHit {
    fn from(d: &BusinessDocument) -> Self {
        Self {
            business_id: d.business_id.clone(),
            name: d.name.clone(),
            latitude: d.latitude,
            longitude: d.longitude,
            stars: d.stars,
        }
    }
}

/// Keyword search over business names.
pub fn search_business(
    index: &Index<BusinessDocument>,
    query: &str,
    top_n: usize,
    sort_by: BusinessSort,
) -> Ranked<BusinessHit> {
    let start = Instant::now();
    let matches = QueryEngine::new(index, BusinessField::Name).search(query);
    let ranked = rank_businesses(matches, sort_by, top_n).map(BusinessHit::from);
    log_search("business", &ranked, start);
    ranked
}

/// Keyword search over review text. Fails if `sort_by` is `Date` and a
/// matching review carries an unparseable date.
pub fn search_reviews(
    index: &Index<ReviewDocument>,
    query: &str,
    top_n: usize,
    sort_by: ReviewSort,
) -> Result<Ranked<ReviewHit>> {
    let start = Instant::now();
    let matches = QueryEngine::new(index, ReviewField::Text).search(query);
    let ranked = rank_reviews(matches, sort_by, top_n)?.map(ReviewHit::from);
    log_search("reviews", &ranked, start);
    Ok(ranked)
}

/// Bounding-box search. The bounds are validated before any document is scanned.
pub fn search_geospatial(
    index: &Index<BusinessDocument>,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    top_n: usize,
    sort_by: BusinessSort,
) -> Result<Ranked<GeoHit>> {
    let bounds = BoundingBox::new(lat_min, lat_max, lon_min, lon_max)?;
    Ok(search_within(index, &bounds, top_n, sort_by))
}

pub fn search_within(
    index: &Index<BusinessDocument>,
    bounds: &BoundingBox,
    top_n: usize,
    sort_by: BusinessSort,
) -> Ranked<GeoHit> {
    let start = Instant::now();
    let ranked = rank_businesses(geo::within(index, bounds), sort_by, top_n).map(GeoHit::from);
    log_search("geospatial", &ranked, start);
    ranked
}

fn log_search<T>(mode: &'static str, ranked: &Ranked<T>, start: Instant) {
    tracing::info!(mode, took_s = start.elapsed().as_secs_f64(), total_hits = ranked.total_matches, returned = ranked.len(), "search executed");
    if ranked.exceeds_matches() {
        tracing::info!(mode, requested = ranked.requested, total_hits = ranked.total_matches, "requested top_n exceeds available results; returning all");
    }
}
