//! Aggregate stats cache and selection bookkeeping

use crate::contract::{FormId, SubmissionId, SubmissionStats, ViewId};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Persists precomputed per-form and per-view stats
#[async_trait]
pub trait StatsCache: Send + Sync {
    async fn cache_form_stats(&self, form_id: FormId, stats: SubmissionStats) -> Result<()>;

    async fn cache_view_stats(
        &self,
        form_id: FormId,
        view_id: ViewId,
        stats: SubmissionStats,
    ) -> Result<()>;
}

/// In-memory stats cache
#[derive(Clone, Default)]
pub struct InMemoryStatsCache {
    forms: Arc<RwLock<HashMap<FormId, SubmissionStats>>>,
    views: Arc<RwLock<HashMap<(FormId, ViewId), SubmissionStats>>>,
}

impl InMemoryStatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form_stats(&self, form_id: FormId) -> Option<SubmissionStats> {
        self.forms.read().get(&form_id).copied()
    }

    pub fn view_stats(&self, form_id: FormId, view_id: ViewId) -> Option<SubmissionStats> {
        self.views.read().get(&(form_id, view_id)).copied()
    }
}

#[async_trait]
impl StatsCache for InMemoryStatsCache {
    async fn cache_form_stats(&self, form_id: FormId, stats: SubmissionStats) -> Result<()> {
        self.forms.write().insert(form_id, stats);
        Ok(())
    }

    async fn cache_view_stats(
        &self,
        form_id: FormId,
        view_id: ViewId,
        stats: SubmissionStats,
    ) -> Result<()> {
        self.views.write().insert((form_id, view_id), stats);
        Ok(())
    }
}

/// Transient per-form record of the submissions a user has selected
pub trait SelectionStore: Send + Sync {
    /// Forget every selection for the form, including an "all selected" state
    fn clear(&self, form_id: FormId);

    /// Drop one submission from the form's selection
    fn deselect(&self, form_id: FormId, submission_id: SubmissionId);
}

#[derive(Clone, Default)]
pub struct NoOpSelectionStore;

impl SelectionStore for NoOpSelectionStore {
    fn clear(&self, _form_id: FormId) {}

    fn deselect(&self, _form_id: FormId, _submission_id: SubmissionId) {}
}

/// In-memory selection store
#[derive(Clone, Default)]
pub struct InMemorySelectionStore {
    selected: Arc<RwLock<HashMap<FormId, BTreeSet<SubmissionId>>>>,
}

impl InMemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self, form_id: FormId, submission_id: SubmissionId) {
        self.selected
            .write()
            .entry(form_id)
            .or_default()
            .insert(submission_id);
    }

    pub fn selected(&self, form_id: FormId) -> Vec<SubmissionId> {
        self.selected
            .read()
            .get(&form_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl SelectionStore for InMemorySelectionStore {
    fn clear(&self, form_id: FormId) {
        self.selected.write().remove(&form_id);
    }

    fn deselect(&self, form_id: FormId, submission_id: SubmissionId) {
        if let Some(ids) = self.selected.write().get_mut(&form_id) {
            ids.remove(&submission_id);
        }
    }
}
