//! Wire types shared between the Folio content store and its clients.
//!
//! Paginated collections (`/api/blog`, `/api/photos`) answer with
//! [`ListPayload`]; the small top-level collections answer with a bare JSON
//! array of their record type.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPayload<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    #[serde(default)]
    pub total_count: u64,
}

impl<T> ListPayload<T> {
    pub fn new(items: Vec<T>, has_more: bool, total_count: u64) -> Self {
        Self {
            items,
            has_more,
            total_count,
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            total_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    pub cover_image: Option<String>,
    /// Markdown body; only present on single-post lookups.
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub taken_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub url: Option<String>,
    pub repo_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Dates are kept as the store's display strings (`2019-09`, `Present`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub role: String,
    pub start_date: String,
    pub end_date: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// What a cache-bust request invalidates on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevalidateTarget {
    Path(String),
    Tag(String),
}

impl RevalidateTarget {
    /// Query parameter name and value for the trigger endpoint.
    pub fn as_query_pair(&self) -> (&'static str, &str) {
        match self {
            Self::Path(path) => ("path", path),
            Self::Tag(tag) => ("tag", tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateResponse {
    pub revalidated: bool,
    /// Server clock at invalidation, epoch milliseconds.
    #[serde(default)]
    pub now: i64,
}
