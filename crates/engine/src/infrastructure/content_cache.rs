//! Memoised, source-scoped view over the content repository.
//!
//! One cache is owned per call context. Changing the enabled sources
//! invalidates everything; otherwise entries (including known misses) live
//! until `invalidate` is called. Repository errors are never memoised.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use charbuild_domain::{AbilityBlockType, ContentEntity, ContentId, ContentSourceId, ContentType};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{ContentQuery, ContentRepo, RepoError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ContentError {
    #[error("No content sources are enabled")]
    NoEnabledContentSources,
    #[error("Content repository error: {0}")]
    Repo(#[from] RepoError),
}

#[derive(Default)]
struct CacheState {
    sources: Vec<ContentSourceId>,
    /// Bumped on every invalidation so in-flight fetches don't repopulate.
    generation: u64,
    /// `None` records a confirmed miss.
    entities: HashMap<(ContentType, ContentId), Option<ContentEntity>>,
    /// Ids returned by the last complete capped load of each type.
    listed: HashMap<ContentType, Vec<ContentId>>,
    trait_names: HashMap<String, Option<ContentEntity>>,
    archetypes: HashMap<ContentId, Option<ContentEntity>>,
}

impl CacheState {
    fn clear(&mut self) {
        self.generation += 1;
        self.entities.clear();
        self.listed.clear();
        self.trait_names.clear();
        self.archetypes.clear();
    }
}

pub struct ContentCache {
    repo: Arc<dyn ContentRepo>,
    max_per_source: usize,
    state: RwLock<CacheState>,
}

impl ContentCache {
    pub fn new(repo: Arc<dyn ContentRepo>, max_per_source: usize) -> Self {
        Self {
            repo,
            max_per_source,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Replace the enabled sources (duplicates dropped, order kept) and
    /// invalidate every memoised entry.
    pub async fn define_enabled_sources(&self, sources: impl IntoIterator<Item = ContentSourceId>) {
        let mut seen = HashSet::new();
        let sources: Vec<_> = sources.into_iter().filter(|s| seen.insert(*s)).collect();

        let mut state = self.state.write().await;
        tracing::debug!(count = sources.len(), "Content sources redefined");
        state.sources = sources;
        state.clear();
    }

    pub async fn enabled_sources(&self) -> Vec<ContentSourceId> {
        self.state.read().await.sources.clone()
    }

    pub async fn invalidate(&self) {
        self.state.write().await.clear();
    }

    async fn snapshot(&self) -> Result<(Vec<ContentSourceId>, u64), ContentError> {
        let state = self.state.read().await;
        if state.sources.is_empty() {
            return Err(ContentError::NoEnabledContentSources);
        }
        Ok((state.sources.clone(), state.generation))
    }

    /// One entity by id. Unset ids resolve to `None` without a query.
    pub async fn get(
        &self,
        content_type: ContentType,
        id: ContentId,
    ) -> Result<Option<ContentEntity>, ContentError> {
        let (sources, generation) = self.snapshot().await?;
        if !id.is_set() {
            return Ok(None);
        }
        if let Some(hit) = self.state.read().await.entities.get(&(content_type, id)) {
            return Ok(hit.clone());
        }

        let found = self.repo.find_by_id(content_type, id, &sources).await?;
        let mut state = self.state.write().await;
        if state.generation == generation {
            state.entities.insert((content_type, id), found.clone());
        }
        Ok(found)
    }

    /// Every entity of a type across enabled sources, ordered by id.
    ///
    /// Each source is queried separately and capped; later sources
    /// overwrite earlier ones on id collisions. A failing source is skipped
    /// (and the listing is not kept, so the next call retries it). Later
    /// calls serve the same listing even when `get` has memoised more.
    pub async fn all(
        &self,
        content_type: ContentType,
        block_type: Option<AbilityBlockType>,
    ) -> Result<Vec<ContentEntity>, ContentError> {
        let (sources, generation) = self.snapshot().await?;

        let merged: BTreeMap<ContentId, ContentEntity> = {
            let state = self.state.read().await;
            if let Some(ids) = state.listed.get(&content_type) {
                ids.iter()
                    .filter_map(|id| match state.entities.get(&(content_type, *id)) {
                        Some(Some(e)) => Some((*id, e.clone())),
                        _ => None,
                    })
                    .collect()
            } else {
                drop(state);
                self.load_all(content_type, &sources, generation).await
            }
        };

        Ok(merged
            .into_values()
            .filter(|e| block_type.map_or(true, |bt| e.ability_block_type() == Some(bt)))
            .collect())
    }

    async fn load_all(
        &self,
        content_type: ContentType,
        sources: &[ContentSourceId],
        generation: u64,
    ) -> BTreeMap<ContentId, ContentEntity> {
        let mut merged = BTreeMap::new();
        let mut complete = true;
        for source in sources {
            match self
                .repo
                .find_all(content_type, *source, ContentQuery::limited(self.max_per_source))
                .await
            {
                Ok(mut entities) => {
                    entities.truncate(self.max_per_source);
                    merged.extend(entities.into_iter().map(|e| (e.id, e)));
                }
                Err(e) => {
                    complete = false;
                    tracing::warn!(
                        content_type = %content_type,
                        source = %source,
                        error = %e,
                        "Content source query failed, continuing without it"
                    );
                }
            }
        }

        let mut state = self.state.write().await;
        if state.generation == generation {
            for (id, entity) in &merged {
                state.entities.insert((content_type, *id), Some(entity.clone()));
            }
            if complete {
                state.listed.insert(content_type, merged.keys().copied().collect());
            }
        }
        merged
    }

    /// Trait entities for the given ids; unresolved ids are skipped.
    pub async fn traits(&self, ids: &[ContentId]) -> Result<Vec<ContentEntity>, ContentError> {
        let mut traits = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(t) = self.get(ContentType::Trait, *id).await? {
                traits.push(t);
            }
        }
        Ok(traits)
    }

    pub async fn trait_by_name(&self, name: &str) -> Result<Option<ContentEntity>, ContentError> {
        let (sources, generation) = self.snapshot().await?;
        let key = name.trim().to_lowercase();
        if let Some(hit) = self.state.read().await.trait_names.get(&key) {
            return Ok(hit.clone());
        }

        let found = self.repo.find_trait_by_name(name.trim(), &sources).await?;
        let mut state = self.state.write().await;
        if state.generation == generation {
            state.trait_names.insert(key, found.clone());
        }
        Ok(found)
    }

    pub async fn archetype_by_dedication_feat(
        &self,
        feat_id: ContentId,
    ) -> Result<Option<ContentEntity>, ContentError> {
        let (sources, generation) = self.snapshot().await?;
        if let Some(hit) = self.state.read().await.archetypes.get(&feat_id) {
            return Ok(hit.clone());
        }

        let found = self
            .repo
            .find_archetype_by_dedication_feat(feat_id, &sources)
            .await?;
        let mut state = self.state.write().await;
        if state.generation == generation {
            state.archetypes.insert(feat_id, found.clone());
        }
        Ok(found)
    }
}
