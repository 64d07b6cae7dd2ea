use crate::model::ModelInfo;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// A trained model together with the metadata describing it.
pub struct LoadedModel<M: ?Sized> {
    pub info: ModelInfo,
    pub model: Box<M>,
}

/// Process-wide slot for the active model.
///
/// Readers take a snapshot `Arc` and keep using it for the whole call, so a
/// concurrent `swap` never shows them a half-replaced model. Writers commit a
/// fully trained and validated model in one pointer store.
pub struct ModelStore<M: ?Sized> {
    slot: ArcSwapOption<LoadedModel<M>>,
}

impl<M: ?Sized> ModelStore<M> {
    pub fn empty() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    pub fn with_model(model: Box<M>, info: ModelInfo) -> Self {
        let store = Self::empty();
        store.swap(model, info);
        store
    }

    pub fn current(&self) -> Option<Arc<LoadedModel<M>>> {
        self.slot.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.load().is_some()
    }

    pub fn info(&self) -> Option<ModelInfo> {
        self.current().map(|m| m.info.clone())
    }

    /// Replaces the active model, returning the one that was serving before.
    pub fn swap(&self, model: Box<M>, info: ModelInfo) -> Option<Arc<LoadedModel<M>>> {
        tracing::info!(
            model_id = %info.model_id,
            name = %info.name,
            training_samples = info.training_samples,
            fit_score = info.fit_score,
            "committing model"
        );
        self.slot.swap(Some(Arc::new(LoadedModel { info, model })))
    }

    pub fn clear(&self) -> Option<Arc<LoadedModel<M>>> {
        self.slot.swap(None)
    }
}

impl<M: ?Sized> Default for ModelStore<M> {
    fn default() -> Self {
        Self::empty()
    }
}
