use crate::document::{BusinessDocument, ReviewDocument};
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::PrimitiveDateTime;

/// Sort keys for business and geospatial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusinessSort {
    /// Descending.
    #[default]
    Stars,
    /// Ascending.
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    /// Descending.
    #[default]
    Useful,
    /// Newest first.
    Date,
}

impl FromStr for BusinessSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stars" => Ok(BusinessSort::Stars),
            "name" => Ok(BusinessSort::Name),
            other => Err(Error::Config(format!("unknown business sort key {other:?} (expected stars or name)"))),
        }
    }
}

impl FromStr for ReviewSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "useful" => Ok(ReviewSort::Useful),
            "date" => Ok(ReviewSort::Date),
            other => Err(Error::Config(format!("unknown review sort key {other:?} (expected useful or date)"))),
        }
    }
}

impl fmt::Display for BusinessSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BusinessSort::Stars => "stars",
            BusinessSort::Name => "name",
        })
    }
}

impl fmt::Display for ReviewSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReviewSort::Useful => "useful",
            ReviewSort::Date => "date",
        })
    }
}

/// A sorted, truncated result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub items: Vec<T>,
    pub total_matches: usize,
    pub requested: usize,
}

impl<T> Ranked<T> {
    /// True when `top_n` asked for more than matched and every match was returned.
    pub fn exceeds_matches(&self) -> bool {
        self.requested > self.total_matches
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Ranked<U> {
        Ranked { items: self.items.into_iter().map(f).collect(), total_matches: self.total_matches, requested: self.requested }
    }
}

/// Stable sort then truncate to `top_n`. Equal keys keep match order.
pub fn rank_by<T, F>(mut items: Vec<T>, top_n: usize, compare: F) -> Ranked<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let total_matches = items.len();
    items.sort_by(compare);
    items.truncate(top_n);
    Ranked { items, total_matches, requested: top_n }
}

pub fn rank_businesses(matches: Vec<&BusinessDocument>, sort_by: BusinessSort, top_n: usize) -> Ranked<&BusinessDocument> {
    match sort_by {
        BusinessSort::Stars => rank_by(matches, top_n, |a, b| b.stars.total_cmp(&a.stars)),
        BusinessSort::Name => rank_by(matches, top_n, |a, b| a.name.cmp(&b.name)),
    }
}

/// Fails on the first unparseable date when sorting by date; the whole query
/// fails rather than dropping or misplacing that review.
pub fn rank_reviews(matches: Vec<&ReviewDocument>, sort_by: ReviewSort, top_n: usize) -> Result<Ranked<&ReviewDocument>> {
    match sort_by {
        ReviewSort::Useful => Ok(rank_by(matches, top_n, |a, b| b.useful.cmp(&a.useful))),
        ReviewSort::Date => {
            let keyed = matches
                .into_iter()
                .map(|r| parse_review_date(r).map(|at| (at, r)))
                .collect::<Result<Vec<_>>>()?;
            Ok(rank_by(keyed, top_n, |a, b| b.0.cmp(&a.0)).map(|(_, r)| r))
        }
    }
}

pub fn parse_review_date(review: &ReviewDocument) -> Result<PrimitiveDateTime> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(review.date.trim(), format)
        .map_err(|_| Error::DateParse { review_id: review.review_id.clone(), value: review.date.clone() })
}
