//! Server-side cache-bust trigger.
//!
//! The content store keeps its own rendered-page cache; after publishing,
//! an operator asks it to revalidate one path or one tag.

use folio_api_types::{RevalidateResponse, RevalidateTarget};
use thiserror::Error;
use tracing::{info, warn};

use crate::fetch::{ContentClient, FetchError};

const REVALIDATE_PATH: [&str; 2] = ["api", "revalidate"];

#[derive(Debug, Error)]
pub enum RevalidateError {
    #[error("revalidation secret is not configured")]
    MissingSecret,
    #[error("revalidation secret was rejected")]
    Unauthorized,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Clone, Debug)]
pub struct RevalidateClient {
    client: ContentClient,
    secret: String,
}

impl RevalidateClient {
    pub fn new(client: ContentClient, secret: Option<String>) -> Result<Self, RevalidateError> {
        match secret {
            Some(secret) if !secret.trim().is_empty() => Ok(Self { client, secret }),
            _ => Err(RevalidateError::MissingSecret),
        }
    }

    pub async fn revalidate(
        &self,
        target: &RevalidateTarget,
    ) -> Result<RevalidateResponse, RevalidateError> {
        let (name, value) = target.as_query_pair();
        let query = [("secret", self.secret.clone()), (name, value.to_string())];

        match self.client.post_json(&REVALIDATE_PATH, &query).await {
            Ok(response) => {
                info!(target_kind = name, target = value, "Revalidation requested");
                Ok(response)
            }
            Err(FetchError::Http { status: 401, .. }) => {
                warn!(target_kind = name, "Revalidation secret rejected");
                Err(RevalidateError::Unauthorized)
            }
            Err(err) => Err(err.into()),
        }
    }
}
