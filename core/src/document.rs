use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::tokenizer::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Business,
    Review,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CollectionKind::Business => "business",
            CollectionKind::Review => "review",
        })
    }
}

/// One ingested row, keyed by column name. Empty cells count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    fn text(&self, name: &str) -> String {
        normalize(self.get(name))
    }

    fn text_or(&self, name: &str, default: &str) -> String {
        self.get(name).map_or_else(|| default.to_string(), |v| normalize(Some(v)))
    }

    fn id(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    fn float(&self, name: &str) -> f64 {
        self.get(name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    fn int(&self, name: &str) -> i64 {
        let Some(v) = self.get(name).map(str::trim) else { return 0 };
        v.parse::<i64>()
            .ok()
            .or_else(|| v.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0)
    }

    fn flag(&self, name: &str) -> bool {
        let Some(v) = self.get(name).map(|v| v.trim().to_ascii_lowercase()) else { return false };
        match v.as_str() {
            "true" | "yes" | "y" | "t" => true,
            "false" | "no" | "n" | "f" => false,
            other => other.parse::<f64>().map(|f| f.is_finite() && f != 0.0).unwrap_or(false),
        }
    }
}

/// A text field of a collection that carries postings.
pub trait IndexedField: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    fn name(self) -> &'static str;
}

/// A typed, stored document of one collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Field: IndexedField;

    const KIND: CollectionKind;

    /// Coerce a raw record. Never fails: malformed cells take their defaults.
    fn from_record(record: &RawRecord) -> Self;

    /// Unique key (`business_id` / `review_id`).
    fn key(&self) -> &str;

    /// Normalized text of every indexed field.
    fn indexed_text(&self) -> Vec<(Self::Field, &str)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessField {
    Name,
    Address,
    City,
    State,
    PostalCode,
    Attributes,
    Categories,
    Hours,
}

impl IndexedField for BusinessField {
    fn name(self) -> &'static str {
        match self {
            BusinessField::Name => "name",
            BusinessField::Address => "address",
            BusinessField::City => "city",
            BusinessField::State => "state",
            BusinessField::PostalCode => "postal_code",
            BusinessField::Attributes => "attributes",
            BusinessField::Categories => "categories",
            BusinessField::Hours => "hours",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDocument {
    pub business_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stars: f64,
    pub review_count: i64,
    pub is_open: bool,
    pub attributes: String,
    pub categories: String,
    pub hours: String,
}

impl Document for BusinessDocument {
    type Field = BusinessField;

    const KIND: CollectionKind = CollectionKind::Business;

    fn from_record(r: &RawRecord) -> Self {
        Self {
            business_id: r.id("business_id"),
            name: r.text("name"),
            address: r.text("address"),
            city: r.text("city"),
            state: r.text("state"),
            postal_code: r.text("postal_code"),
            latitude: r.float("latitude"),
            longitude: r.float("longitude"),
            stars: r.float("stars"),
            review_count: r.int("review_count"),
            is_open: r.flag("is_open"),
            attributes: r.text_or("attributes", "{}"),
            categories: r.text("categories"),
            hours: r.text_or("hours", "{}"),
        }
    }

    fn key(&self) -> &str {
        &self.business_id
    }

    fn indexed_text(&self) -> Vec<(BusinessField, &str)> {
        vec![
            (BusinessField::Name, &self.name),
            (BusinessField::Address, &self.address),
            (BusinessField::City, &self.city),
            (BusinessField::State, &self.state),
            (BusinessField::PostalCode, &self.postal_code),
            (BusinessField::Attributes, &self.attributes),
            (BusinessField::Categories, &self.categories),
            (BusinessField::Hours, &self.hours),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewField {
    Text,
}

impl IndexedField for ReviewField {
    fn name(self) -> &'static str {
        match self {
            ReviewField::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    pub review_id: String,
    pub user_id: String,
    pub business_id: String,
    pub stars: f64,
    pub useful: i64,
    pub funny: i64,
    pub cool: i64,
    pub text: String,
    /// `YYYY-MM-DD HH:MM:SS`, kept verbatim; parsed only for date sorts.
    pub date: String,
}

impl Document for ReviewDocument {
    type Field = ReviewField;

    const KIND: CollectionKind = CollectionKind::Review;

    fn from_record(r: &RawRecord) -> Self {
        Self {
            review_id: r.id("review_id"),
            user_id: r.id("user_id"),
            business_id: r.id("business_id"),
            stars: r.float("stars"),
            useful: r.int("useful"),
            funny: r.int("funny"),
            cool: r.int("cool"),
            text: r.text("text"),
            date: r.id("date"),
        }
    }

    fn key(&self) -> &str {
        &self.review_id
    }

    fn indexed_text(&self) -> Vec<(ReviewField, &str)> {
        vec![(ReviewField::Text, &self.text)]
    }
}
