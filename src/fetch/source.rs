use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::cache::ResourceKey;

use super::client::ContentClient;
use super::error::FetchError;

/// Where a coordinator loads resources from.
#[async_trait]
pub trait ContentSource<T>: Send + Sync {
    async fn fetch(&self, key: &ResourceKey) -> Result<T, FetchError>;
}

#[async_trait]
impl<T> ContentSource<T> for ContentClient
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, key: &ResourceKey) -> Result<T, FetchError> {
        self.get_json(&key.path_segments(), &key.query()).await
    }
}
