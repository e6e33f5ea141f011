//! Explicit cache context.
//!
//! A [`ContentCache`] is created when the application root mounts and dropped
//! when it unmounts. Views receive it by reference; there is no global cache.

use std::sync::Arc;

use folio_api_types::{BlogPost, Education, Experience, ListPayload, Photo, Project};
use tracing::info;

use crate::cache::{CacheConfig, ListKind, ResourceCache};
use crate::fetch::{ContentClient, ContentSource, FetchCoordinator};
use crate::list::{ListOptions, PaginatedListController};

/// One coordinator (and store) per resource kind.
pub struct ContentCache {
    config: CacheConfig,
    projects: Arc<FetchCoordinator<Vec<Project>>>,
    project: Arc<FetchCoordinator<Project>>,
    education: Arc<FetchCoordinator<Vec<Education>>>,
    experience: Arc<FetchCoordinator<Vec<Experience>>>,
    posts: Arc<FetchCoordinator<ListPayload<BlogPost>>>,
    post: Arc<FetchCoordinator<BlogPost>>,
    photos: Arc<FetchCoordinator<ListPayload<Photo>>>,
}

/// Builds a [`ContentCache`] with per-kind sources, defaulting to one client.
pub struct ContentCacheBuilder {
    config: CacheConfig,
    projects: Arc<dyn ContentSource<Vec<Project>>>,
    project: Arc<dyn ContentSource<Project>>,
    education: Arc<dyn ContentSource<Vec<Education>>>,
    experience: Arc<dyn ContentSource<Vec<Experience>>>,
    posts: Arc<dyn ContentSource<ListPayload<BlogPost>>>,
    post: Arc<dyn ContentSource<BlogPost>>,
    photos: Arc<dyn ContentSource<ListPayload<Photo>>>,
}

impl ContentCacheBuilder {
    pub fn new(config: CacheConfig, client: ContentClient) -> Self {
        let client = Arc::new(client);
        Self {
            config,
            projects: client.clone(),
            project: client.clone(),
            education: client.clone(),
            experience: client.clone(),
            posts: client.clone(),
            post: client.clone(),
            photos: client,
        }
    }

    pub fn posts_source(mut self, source: Arc<dyn ContentSource<ListPayload<BlogPost>>>) -> Self {
        self.posts = source;
        self
    }

    pub fn photos_source(mut self, source: Arc<dyn ContentSource<ListPayload<Photo>>>) -> Self {
        self.photos = source;
        self
    }

    pub fn projects_source(mut self, source: Arc<dyn ContentSource<Vec<Project>>>) -> Self {
        self.projects = source;
        self
    }

    pub fn build(self) -> ContentCache {
        let max_age = self.config.max_age();
        fn coordinator<T: Clone + Send + Sync + 'static>(
            source: Arc<dyn ContentSource<T>>,
            max_age: std::time::Duration,
        ) -> Arc<FetchCoordinator<T>> {
            Arc::new(FetchCoordinator::new(
                Arc::new(ResourceCache::new()),
                source,
                max_age,
            ))
        }

        ContentCache {
            projects: coordinator(self.projects, max_age),
            project: coordinator(self.project, max_age),
            education: coordinator(self.education, max_age),
            experience: coordinator(self.experience, max_age),
            posts: coordinator(self.posts, max_age),
            post: coordinator(self.post, max_age),
            photos: coordinator(self.photos, max_age),
            config: self.config,
        }
    }
}

impl ContentCache {
    pub fn new(config: CacheConfig, client: ContentClient) -> Self {
        ContentCacheBuilder::new(config, client).build()
    }

    pub fn builder(config: CacheConfig, client: ContentClient) -> ContentCacheBuilder {
        ContentCacheBuilder::new(config, client)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn projects(&self) -> &Arc<FetchCoordinator<Vec<Project>>> {
        &self.projects
    }

    pub fn project(&self) -> &Arc<FetchCoordinator<Project>> {
        &self.project
    }

    pub fn education(&self) -> &Arc<FetchCoordinator<Vec<Education>>> {
        &self.education
    }

    pub fn experience(&self) -> &Arc<FetchCoordinator<Vec<Experience>>> {
        &self.experience
    }

    pub fn posts(&self) -> &Arc<FetchCoordinator<ListPayload<BlogPost>>> {
        &self.posts
    }

    pub fn post(&self) -> &Arc<FetchCoordinator<BlogPost>> {
        &self.post
    }

    pub fn photos(&self) -> &Arc<FetchCoordinator<ListPayload<Photo>>> {
        &self.photos
    }

    /// Controller for a blog index view, optionally pre-filtered.
    pub fn blog_list(&self, category: Option<String>) -> PaginatedListController<BlogPost> {
        PaginatedListController::new(
            ListKind::Posts,
            Arc::clone(&self.posts),
            ListOptions::for_kind(ListKind::Posts, &self.config),
            category,
        )
    }

    /// Controller for a photo gallery view, optionally pre-filtered.
    pub fn photo_gallery(&self, category: Option<String>) -> PaginatedListController<Photo> {
        PaginatedListController::new(
            ListKind::Photos,
            Arc::clone(&self.photos),
            ListOptions::for_kind(ListKind::Photos, &self.config),
            category,
        )
    }

    /// Drop every local entry, e.g. after a server-side cache-bust.
    pub fn invalidate_all(&self) {
        self.projects.invalidate_all();
        self.project.invalidate_all();
        self.education.invalidate_all();
        self.experience.invalidate_all();
        self.posts.invalidate_all();
        self.post.invalidate_all();
        self.photos.invalidate_all();
        info!("Local content cache cleared");
    }

    /// Total number of cached entries across all kinds.
    pub fn len(&self) -> usize {
        self.projects.store().len()
            + self.project.store().len()
            + self.education.store().len()
            + self.experience.store().len()
            + self.posts.store().len()
            + self.post.store().len()
            + self.photos.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use folio_api_types::ListPayload;

    use super::*;
    use crate::cache::{ListQuery, ResourceKey};

    fn cache() -> ContentCache {
        let client = ContentClient::new("http://127.0.0.1:9/").expect("client");
        ContentCache::new(CacheConfig::default(), client)
    }

    #[test]
    fn list_controllers_use_configured_page_sizes() {
        let cache = cache();
        assert_eq!(cache.blog_list(None).page_size(), 10);
        assert_eq!(cache.photo_gallery(None).page_size(), 24);
    }

    #[tokio::test]
    async fn seeded_lists_share_the_posts_store() {
        let cache = cache();
        let list = cache.blog_list(Some("Travel".into()));
        list.initialize(ListPayload::empty());

        let key = ResourceKey::Posts(ListQuery::first(10, Some("Travel".into())));
        assert!(cache.posts().is_fresh(&key, cache.config().max_age()));
        assert_eq!(cache.len(), 1);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
