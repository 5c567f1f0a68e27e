use crate::{
    cache::{CacheStore, MemoryCacheStore, DEFAULT_CACHE_TTL},
    context::DEFAULT_CONTEXT_WINDOW,
    instruction::{InstructionParam, PromptContext},
    CritiquePipeline,
};
use proofit_sdk::LanguageModel;
use std::{sync::Arc, time::Duration};

/// Default upper bound on a single model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

/// Parameters required to create a pipeline.
/// # Default Values
/// - `classifier_model`: `None` (the critique model classifies too)
/// - `instructions`: `vec![]`
/// - `cache_store`: a fresh [`MemoryCacheStore`]
/// - `cache_ttl`: 1 hour
/// - `model_timeout`: 60 seconds
/// - `context_window`: 10
pub struct PipelineParams {
    /// The language model that writes critiques and follow-up replies.
    pub model: Arc<dyn LanguageModel>,
    /// A separate, usually cheaper, model for classification.
    pub classifier_model: Option<Arc<dyn LanguageModel>>,
    /// Extra instructions appended to every generation's system prompt.
    pub instructions: Vec<InstructionParam<PromptContext>>,
    /// Backend of the result cache. Constructed once and shared.
    pub cache_store: Arc<dyn CacheStore>,
    pub cache_ttl: Duration,
    /// Upper bound on each model call.
    pub model_timeout: Duration,
    /// Number of prior turns replayed for a follow-up.
    pub context_window: usize,
}

impl PipelineParams {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            classifier_model: None,
            instructions: Vec::new(),
            cache_store: Arc::new(MemoryCacheStore::new()),
            cache_ttl: DEFAULT_CACHE_TTL,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    /// Set the classifier model
    #[must_use]
    pub fn classifier_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.classifier_model = Some(model);
        self
    }

    /// Add an instruction
    #[must_use]
    pub fn add_instruction(mut self, instruction: impl Into<InstructionParam<PromptContext>>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Set the instructions
    #[must_use]
    pub fn instructions(mut self, instructions: Vec<InstructionParam<PromptContext>>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Set the cache backend
    #[must_use]
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = store;
        self
    }

    /// Set how long cached results live
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the upper bound on each model call
    #[must_use]
    pub fn model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Set the number of replayed follow-up turns
    #[must_use]
    pub fn context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    #[must_use]
    pub fn build(self) -> CritiquePipeline {
        CritiquePipeline::new(self)
    }
}
