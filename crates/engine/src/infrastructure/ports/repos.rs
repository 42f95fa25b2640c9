//! Content repository port.
//!
//! The engine only ever reads content. Every query is scoped to content
//! sources; multi-source reads are issued one source at a time by the
//! content cache.

use async_trait::async_trait;
use charbuild_domain::{ContentEntity, ContentId, ContentSourceId, ContentType};

use super::error::RepoError;

/// Per-query limits for `find_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentQuery {
    /// Maximum rows returned for a single source.
    pub limit: usize,
}

impl ContentQuery {
    pub fn limited(limit: usize) -> Self {
        Self { limit }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Every entity of `content_type` from a single source.
    async fn find_all(
        &self,
        content_type: ContentType,
        source: ContentSourceId,
        query: ContentQuery,
    ) -> Result<Vec<ContentEntity>, RepoError>;

    /// One entity by id, restricted to the given sources. `Ok(None)` when absent.
    async fn find_by_id(
        &self,
        content_type: ContentType,
        id: ContentId,
        sources: &[ContentSourceId],
    ) -> Result<Option<ContentEntity>, RepoError>;

    /// Trait lookup by exact name (case-insensitive).
    async fn find_trait_by_name(
        &self,
        name: &str,
        sources: &[ContentSourceId],
    ) -> Result<Option<ContentEntity>, RepoError>;

    /// The archetype whose dedication feat is `feat_id`.
    async fn find_archetype_by_dedication_feat(
        &self,
        feat_id: ContentId,
        sources: &[ContentSourceId],
    ) -> Result<Option<ContentEntity>, RepoError>;
}
