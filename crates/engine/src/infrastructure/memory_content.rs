//! Content repository over a JSON bundle held in memory.
//!
//! Bundle format: `{"entities": [ ...content entities... ]}`. Entities
//! without a `content_source_id` belong to no source and are never served.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use charbuild_domain::{ContentDetails, ContentEntity, ContentId, ContentSourceId, ContentType};
use serde::Deserialize;

use crate::infrastructure::ports::{ContentQuery, ContentRepo, RepoError};

#[derive(Debug, Deserialize)]
struct ContentBundle {
    #[serde(default)]
    entities: Vec<ContentEntity>,
}

pub struct InMemoryContentRepo {
    by_type: HashMap<ContentType, Vec<ContentEntity>>,
}

impl InMemoryContentRepo {
    pub fn new(entities: Vec<ContentEntity>) -> Self {
        let mut by_type: HashMap<ContentType, Vec<ContentEntity>> = HashMap::new();
        for entity in entities {
            by_type.entry(entity.content_type()).or_default().push(entity);
        }
        for list in by_type.values_mut() {
            list.sort_by_key(|e| e.id);
        }
        Self { by_type }
    }

    pub fn from_json(json: &str) -> Result<Self, RepoError> {
        let bundle: ContentBundle =
            serde_json::from_str(json).map_err(RepoError::serialization)?;
        Ok(Self::new(bundle.entities))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RepoError::database("read_bundle", format!("{}: {}", path.display(), e)))?;
        let repo = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            entities = repo.len(),
            "Loaded content bundle"
        );
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn in_sources<'a>(
        &'a self,
        content_type: ContentType,
        sources: &'a [ContentSourceId],
    ) -> impl Iterator<Item = &'a ContentEntity> + 'a {
        self.by_type
            .get(&content_type)
            .into_iter()
            .flatten()
            .filter(move |e| e.content_source_id.is_some_and(|s| sources.contains(&s)))
    }
}

#[async_trait]
impl ContentRepo for InMemoryContentRepo {
    async fn find_all(
        &self,
        content_type: ContentType,
        source: ContentSourceId,
        query: ContentQuery,
    ) -> Result<Vec<ContentEntity>, RepoError> {
        Ok(self
            .in_sources(content_type, std::slice::from_ref(&source))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        content_type: ContentType,
        id: ContentId,
        sources: &[ContentSourceId],
    ) -> Result<Option<ContentEntity>, RepoError> {
        Ok(self
            .in_sources(content_type, sources)
            .find(|e| e.id == id)
            .cloned())
    }

    async fn find_trait_by_name(
        &self,
        name: &str,
        sources: &[ContentSourceId],
    ) -> Result<Option<ContentEntity>, RepoError> {
        Ok(self
            .in_sources(ContentType::Trait, sources)
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_archetype_by_dedication_feat(
        &self,
        feat_id: ContentId,
        sources: &[ContentSourceId],
    ) -> Result<Option<ContentEntity>, RepoError> {
        Ok(self
            .in_sources(ContentType::Archetype, sources)
            .find(|e| {
                matches!(
                    e.details,
                    ContentDetails::Archetype { dedication_feat_id: Some(id), .. } if id == feat_id
                )
            })
            .cloned())
    }
}
