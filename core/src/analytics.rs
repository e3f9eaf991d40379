use crate::document::{BusinessDocument, IndexedField, ReviewDocument, ReviewField};
use crate::error::Result;
use crate::geo::BoundingBox;
use crate::store::Index;
use std::collections::HashMap;

/// `(user_id, review count)`, most active first; ties keep first-seen order.
pub fn reviews_per_user(reviews: &Index<ReviewDocument>) -> Vec<(String, usize)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for (_, review) in reviews.documents() {
        match slots.get(review.user_id.as_str()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(&review.user_id, counts.len());
                counts.push((review.user_id.clone(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The `n` most frequent indexed review terms by total occurrences.
pub fn top_terms(reviews: &Index<ReviewDocument>, n: usize) -> Vec<(String, u64)> {
    let Some(field) = reviews.inverted_index().field(ReviewField::Text.name()) else {
        return Vec::new();
    };
    let mut totals: Vec<(String, u64)> = field
        .terms()
        .map(|(term, postings)| (term.to_string(), postings.iter().map(|p| u64::from(p.term_frequency)).sum()))
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    totals.truncate(n);
    totals
}

/// Bounding box around every business `user_id` has reviewed. Reviews of
/// businesses missing from `businesses` are ignored.
pub fn user_bounding_box(
    reviews: &Index<ReviewDocument>,
    businesses: &Index<BusinessDocument>,
    user_id: &str,
) -> Option<Result<BoundingBox>> {
    let points = reviews
        .documents()
        .filter(|(_, r)| r.user_id == user_id)
        .filter_map(|(_, r)| businesses.get(&r.business_id))
        .map(|b| (b.latitude, b.longitude));
    BoundingBox::enclosing(points)
}
