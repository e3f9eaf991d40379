//! Command-line surface over the business and review indexes.
//!
//! [`run`] returns the lines to print so the whole command path can be
//! driven from tests without capturing stdout.

use anyhow::{Context, Result};
use bizsearch_core::analytics::{reviews_per_user, top_terms, user_bounding_box};
use bizsearch_core::config::IndexLayout;
use bizsearch_core::search::{search_business, search_geospatial, search_reviews};
use bizsearch_core::{BusinessDocument, BusinessSort, Index, Ranked, ReviewDocument, ReviewSort};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "search")]
#[command(about = "Search indexed businesses and reviews", long_about = None)]
pub struct Cli {
    /// Directory holding indexdir/ and review_indexdir/ (default: $BIZSEARCH_INDEX_ROOT or .)
    #[arg(long, global = true)]
    pub index_root: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search businesses by name keywords
    #[command(name = "search_business")]
    SearchBusiness {
        /// Keywords to search for businesses
        query: String,
        /// Number of results to return
        #[arg(long = "top_n", default_value_t = 10)]
        top_n: usize,
        /// stars or name
        #[arg(long = "sort_by", value_parser = str::parse::<BusinessSort>, default_value_t = BusinessSort::Stars)]
        sort_by: BusinessSort,
    },
    /// Search review text
    #[command(name = "search_reviews")]
    SearchReviews {
        /// Keywords to search for reviews
        query: String,
        #[arg(long = "top_n", default_value_t = 10)]
        top_n: usize,
        /// useful or date
        #[arg(long = "sort_by", value_parser = str::parse::<ReviewSort>, default_value_t = ReviewSort::Useful)]
        sort_by: ReviewSort,
    },
    /// Businesses inside a latitude/longitude box
    #[command(name = "search_geospatial")]
    SearchGeospatial {
        #[arg(allow_negative_numbers = true)]
        lat_min: f64,
        #[arg(allow_negative_numbers = true)]
        lat_max: f64,
        #[arg(allow_negative_numbers = true)]
        lon_min: f64,
        #[arg(allow_negative_numbers = true)]
        lon_max: f64,
        #[arg(long = "top_n", default_value_t = 10)]
        top_n: usize,
        /// stars or name
        #[arg(long = "sort_by", value_parser = str::parse::<BusinessSort>, default_value_t = BusinessSort::Stars)]
        sort_by: BusinessSort,
    },
    /// Users with the most reviews
    #[command(name = "top_reviewers")]
    TopReviewers {
        #[arg(long = "top_n", default_value_t = 10)]
        top_n: usize,
    },
    /// Most frequent indexed review terms
    #[command(name = "top_terms")]
    TopTerms {
        #[arg(long = "top_n", default_value_t = 10)]
        top_n: usize,
    },
    /// Bounding box around the businesses a user has reviewed
    #[command(name = "user_area")]
    UserArea { user_id: String },
}

/// Execute one command and return its output lines.
pub fn run(cli: &Cli) -> Result<Vec<String>> {
    let layout = IndexLayout::resolve(cli.index_root.as_deref())?;

    match &cli.command {
        Commands::SearchBusiness { query, top_n, sort_by } => {
            let index = open_businesses(&layout)?;
            let results = search_business(&index, query, *top_n, *sort_by);
            let mut out = Vec::with_capacity(results.len() + 1);
            if results.exceeds_matches() {
                out.push(format!(
                    "Requested top_n ({}) exceeds available results. Returning all {} results.",
                    results.requested, results.total_matches
                ));
            }
            out.extend(render(&results, |h| format!("ID: {}, Name: {}, Score: {}", h.business_id, h.name, score(h.stars))));
            Ok(out)
        }
        Commands::SearchReviews { query, top_n, sort_by } => {
            let index = open_reviews(&layout)?;
            let results = search_reviews(&index, query, *top_n, *sort_by)?;
            Ok(render(&results, |h| {
                format!(
                    "Review ID: {}, Text: {}, Score: {}, Useful: {}, Date: {}",
                    h.review_id,
                    h.text,
                    score(h.stars),
                    h.useful,
                    h.date
                )
            }))
        }
        Commands::SearchGeospatial { lat_min, lat_max, lon_min, lon_max, top_n, sort_by } => {
            let index = open_businesses(&layout)?;
            let results =
                search_geospatial(&index, *lat_min, *lat_max, *lon_min, *lon_max, *top_n, *sort_by)?;
            Ok(render(&results, |h| {
                format!(
                    "ID: {}, Name: {}, Latitude: {}, Longitude: {}, Score: {}",
                    h.business_id,
                    h.name,
                    score(h.latitude),
                    score(h.longitude),
                    score(h.stars)
                )
            }))
        }
        Commands::TopReviewers { top_n } => {
            let index = open_reviews(&layout)?;
            Ok(reviews_per_user(&index)
                .into_iter()
                .take(*top_n)
                .map(|(user, count)| format!("User ID: {user}, Reviews: {count}"))
                .collect())
        }
        Commands::TopTerms { top_n } => {
            let index = open_reviews(&layout)?;
            Ok(top_terms(&index, *top_n).into_iter().map(|(term, count)| format!("Term: {term}, Count: {count}")).collect())
        }
        Commands::UserArea { user_id } => {
            let reviews = open_reviews(&layout)?;
            let businesses = open_businesses(&layout)?;
            match user_bounding_box(&reviews, &businesses, user_id) {
                None => Ok(vec![format!("No reviewed businesses found for user {user_id}")]),
                Some(area) => {
                    let area = area?;
                    Ok(vec![format!(
                        "User ID: {user_id}, Latitude: [{}, {}], Longitude: [{}, {}]",
                        score(area.lat_min()),
                        score(area.lat_max()),
                        score(area.lon_min()),
                        score(area.lon_max())
                    )])
                }
            }
        }
    }
}

fn open_businesses(layout: &IndexLayout) -> Result<Index<BusinessDocument>> {
    let paths = layout.business();
    Index::open(paths.clone()).with_context(|| format!("opening business index at {}", paths.root.display()))
}

fn open_reviews(layout: &IndexLayout) -> Result<Index<ReviewDocument>> {
    let paths = layout.review();
    Index::open(paths.clone()).with_context(|| format!("opening review index at {}", paths.root.display()))
}

fn render<T>(results: &Ranked<T>, line: impl Fn(&T) -> String) -> Vec<String> {
    results.items.iter().map(line).collect()
}

/// Floats always print with a fractional part, so 4 stars reads `4.0`.
fn score(value: f64) -> String {
    format!("{value:?}")
}
