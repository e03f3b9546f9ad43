//! Identity-keyed artifact cache owned by one stage

use std::fmt::Display;
use std::hash::Hash;

use crate::foundation::collections::{BatchConflict, IdentityArena};
use crate::pipeline::StageError;

slotmap::new_key_type! {
    /// Generational slot key of a cached artifact
    pub struct ArtifactKey;
}

/// Stage-owned map from identity to artifact
///
/// Lookups that miss are consistency errors: they mean an upstream stage
/// announced a removal or addition out of order.
#[derive(Debug)]
pub struct StageCache<I, A> {
    stage: &'static str,
    arena: IdentityArena<I, ArtifactKey, A>,
}

impl<I: Eq + Hash + Clone + Display, A> StageCache<I, A> {
    /// Create an empty cache for `stage`
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            arena: IdentityArena::new(),
        }
    }

    /// Validate a whole batch before any mutation
    pub fn check_batch<'a>(
        &self,
        removed: impl IntoIterator<Item = &'a I>,
        added: impl IntoIterator<Item = &'a I>,
    ) -> Result<(), StageError>
    where
        I: 'a,
    {
        self.arena.check_batch(removed, added).map_err(|conflict| {
            let error = match conflict {
                BatchConflict::Missing(id) => StageError::MissingArtifact {
                    stage: self.stage,
                    id: id.to_string(),
                },
                BatchConflict::Duplicate(id) => StageError::DuplicateArtifact {
                    stage: self.stage,
                    id: id.to_string(),
                },
            };
            log::error!("rejecting batch: {}", error);
            error
        })
    }

    /// Remove the artifact for `id`
    pub fn take(&mut self, id: &I) -> Result<A, StageError> {
        self.arena.remove(id).ok_or_else(|| {
            let error = StageError::MissingArtifact {
                stage: self.stage,
                id: id.to_string(),
            };
            log::error!("{}", error);
            error
        })
    }

    /// Cache the artifact for `id`
    pub fn put(&mut self, id: I, artifact: A) -> Result<ArtifactKey, StageError> {
        let stage = self.stage;
        let label = id.to_string();
        self.arena.insert(id, artifact).map_err(|_| {
            let error = StageError::DuplicateArtifact { stage, id: label };
            log::error!("{}", error);
            error
        })
    }

    /// Artifact for `id`
    pub fn get(&self, id: &I) -> Option<&A> {
        self.arena.get(id)
    }

    /// Whether `id` has an artifact
    pub fn contains(&self, id: &I) -> bool {
        self.arena.contains(id)
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Cached identities (unordered)
    pub fn ids(&self) -> impl Iterator<Item = &I> {
        self.arena.ids()
    }

    /// Cached artifacts (unordered)
    pub fn values(&self) -> impl Iterator<Item = &A> {
        self.arena.values()
    }
}
