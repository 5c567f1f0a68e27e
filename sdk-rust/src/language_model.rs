use crate::{LanguageModelInput, LanguageModelResult, ModelResponse};

#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    fn provider(&self) -> &'static str;
    fn model_id(&self) -> String;
    /// Generate a complete response. An `Ok` value always means the provider
    /// answered with a 2xx status.
    async fn generate(&self, input: LanguageModelInput) -> LanguageModelResult<ModelResponse>;
}
