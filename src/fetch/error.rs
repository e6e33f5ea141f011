use thiserror::Error;

use crate::cache::ResourceKey;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("content store responded with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Transport failure with the request URL stripped; query strings may
    /// carry the revalidation secret.
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }

    /// Stable label for logs and metrics; never shown to readers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::Parse(_) => "parse",
            Self::Url(_) => "url",
        }
    }

    /// The single message surfaced to the presentation layer.
    pub fn user_message(&self, key: &ResourceKey) -> String {
        format!("Could not load {}. Please try again.", label(key))
    }
}

fn label(key: &ResourceKey) -> &'static str {
    match key {
        ResourceKey::Projects | ResourceKey::Project { .. } => "projects",
        ResourceKey::Education => "education",
        ResourceKey::Experience => "experience",
        ResourceKey::Posts(_) | ResourceKey::Post { .. } => "blog posts",
        ResourceKey::Photos(_) => "photos",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListQuery;

    #[test]
    fn kinds_collapse_into_one_message() {
        let key = ResourceKey::Posts(ListQuery::first(10, None));
        let http = FetchError::http(503, "unavailable");
        let parse = FetchError::from(
            serde_json::from_str::<u32>("not json").expect_err("invalid json"),
        );

        assert_eq!(http.kind(), "http");
        assert_eq!(parse.kind(), "parse");
        assert_eq!(http.user_message(&key), parse.user_message(&key));
        assert_eq!(
            http.user_message(&key),
            "Could not load blog posts. Please try again."
        );
    }
}
