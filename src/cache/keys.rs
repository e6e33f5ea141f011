//! Resource key definitions.
//!
//! A [`ResourceKey`] names one cacheable collection or query and maps to
//! exactly one content-store request.

use std::fmt;

/// Page cursor and filter for paginated collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
}

impl ListQuery {
    /// Build a query, clamping `page` and `limit` to at least 1.
    pub fn new(page: u32, limit: u32, category: Option<String>) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            category,
        }
    }

    pub fn first(limit: u32, category: Option<String>) -> Self {
        Self::new(1, limit, category)
    }

    /// The same filter, one page further.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }
}

/// Which paginated collection a list controller walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Posts,
    Photos,
}

impl ListKind {
    pub fn key(self, query: ListQuery) -> ResourceKey {
        match self {
            Self::Posts => ResourceKey::Posts(query),
            Self::Photos => ResourceKey::Photos(query),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "blog",
            Self::Photos => "photos",
        }
    }
}

/// Identifies a cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    // Top-level collections (bare arrays)
    Projects,
    Education,
    Experience,

    // Paginated collections
    Posts(ListQuery),
    Photos(ListQuery),

    // Single-item lookups
    Post { slug: String },
    Project { slug: String },
}

impl ResourceKey {
    /// Path segments of the content-store endpoint, relative to the API base
    /// URL. Slugs stay a single segment and are percent-encoded on join.
    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            Self::Projects => vec!["api", "projects"],
            Self::Education => vec!["api", "education"],
            Self::Experience => vec!["api", "experience"],
            Self::Posts(_) => vec!["api", "blog"],
            Self::Photos(_) => vec!["api", "photos"],
            Self::Post { slug } => vec!["api", "blog", slug.as_str()],
            Self::Project { slug } => vec!["api", "projects", slug.as_str()],
        }
    }

    /// Query parameters for the content-store request.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Posts(query) => {
                let mut pairs = list_pairs(query);
                pairs.push(("published", "true".to_string()));
                pairs
            }
            Self::Photos(query) => list_pairs(query),
            _ => Vec::new(),
        }
    }

    /// The list query for paginated keys.
    pub fn list_query(&self) -> Option<&ListQuery> {
        match self {
            Self::Posts(query) | Self::Photos(query) => Some(query),
            _ => None,
        }
    }

    /// Short label used as a metric/log dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Education => "education",
            Self::Experience => "experience",
            Self::Posts(_) => "blog",
            Self::Photos(_) => "photos",
            Self::Post { .. } => "blog-post",
            Self::Project { .. } => "project",
        }
    }
}

fn list_pairs(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("page", query.page.to_string()),
        ("limit", query.limit.to_string()),
    ];
    if let Some(category) = &query.category {
        pairs.push(("category", category.clone()));
    }
    pairs
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posts(query) | Self::Photos(query) => {
                write!(
                    f,
                    "{}:page={}:limit={}",
                    self.kind(),
                    query.page,
                    query.limit
                )?;
                if let Some(category) = &query.category {
                    write!(f, ":category={category}")?;
                }
                Ok(())
            }
            Self::Post { slug } | Self::Project { slug } => write!(f, "{}:{slug}", self.kind()),
            _ => f.write_str(self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_composite_form_for_lists() {
        let key = ResourceKey::Posts(ListQuery::new(2, 10, Some("Travel".into())));
        assert_eq!(key.to_string(), "blog:page=2:limit=10:category=Travel");

        let key = ResourceKey::Photos(ListQuery::first(24, None));
        assert_eq!(key.to_string(), "photos:page=1:limit=24");

        assert_eq!(ResourceKey::Projects.to_string(), "projects");
        assert_eq!(
            ResourceKey::Post {
                slug: "kyoto".into()
            }
            .to_string(),
            "blog-post:kyoto"
        );
    }

    #[test]
    fn blog_query_includes_published_filter() {
        let key = ResourceKey::Posts(ListQuery::new(3, 10, Some("Travel".into())));
        let query = key.query();
        assert!(query.contains(&("page", "3".to_string())));
        assert!(query.contains(&("limit", "10".to_string())));
        assert!(query.contains(&("category", "Travel".to_string())));
        assert!(query.contains(&("published", "true".to_string())));
    }

    #[test]
    fn photos_query_omits_absent_category() {
        let key = ResourceKey::Photos(ListQuery::first(24, None));
        assert_eq!(
            key.query(),
            vec![("page", "1".to_string()), ("limit", "24".to_string())]
        );
        assert!(ResourceKey::Education.query().is_empty());
    }

    #[test]
    fn list_query_clamps_to_one() {
        let query = ListQuery::new(0, 0, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 1);
        assert_eq!(query.next().page, 2);
    }

    #[test]
    fn pages_with_different_filters_are_distinct_keys() {
        let travel = ListKind::Posts.key(ListQuery::first(10, Some("Travel".into())));
        let all = ListKind::Posts.key(ListQuery::first(10, None));
        assert_ne!(travel, all);
        assert_eq!(
            ResourceKey::Project {
                slug: "atlas".into()
            }
            .path_segments(),
            vec!["api", "projects", "atlas"]
        );
    }
}
