//! HTTP client for the content-store read API.

use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use url::ParseError;

use super::error::FetchError;

#[derive(Clone, Debug)]
pub struct ContentClient {
    client: Client,
    base: Url,
}

impl ContentClient {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_user_agent(base_url, Self::user_agent())
    }

    pub fn with_user_agent(base_url: &str, user_agent: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(FetchError::Url(ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Append `segments` to the base path, percent-encoding each one.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Url(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        self.request(Method::GET, segments, query).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        self.request(Method::POST, segments, query).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.url(segments, query)?;
        let resp = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(FetchError::network)?;
        Self::handle(resp).await
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, FetchError> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(FetchError::network)?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(FetchError::http(status.as_u16(), text));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResourceKey;

    #[test]
    fn url_keeps_base_path_prefix() {
        let client = ContentClient::new("https://example.com/site").expect("client");
        let url = client
            .url(&["api", "blog"], &[("page", "2".to_string())])
            .expect("url");
        assert_eq!(url.as_str(), "https://example.com/site/api/blog?page=2");
    }

    #[test]
    fn url_without_query_has_no_question_mark() {
        let client = ContentClient::new("https://example.com/").expect("client");
        let url = client.url(&["api", "projects"], &[]).expect("url");
        assert_eq!(url.as_str(), "https://example.com/api/projects");
    }

    #[test]
    fn slugs_stay_one_path_segment() {
        let client = ContentClient::new("https://example.com/site/").expect("client");
        let key = ResourceKey::Post {
            slug: "notes/2024?draft#top".to_string(),
        };
        let url = client.url(&key.path_segments(), &[]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://example.com/site/api/blog/notes%2F2024%3Fdraft%23top"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ContentClient::new("not a url").expect_err("invalid url");
        assert!(matches!(err, FetchError::Url(_)));
    }
}
