use crate::{
    cache::{Fingerprint, ResultCache},
    classifier::Classifier,
    context::build_context,
    fix_prompt::{build_fix_prompt, is_fix_prompt_request},
    generator::CritiqueGenerator,
    instruction::PromptContext,
    opentelemetry::{trace_follow_up, trace_submit},
    parser::{parse, CritiqueOutcome},
    request::{normalize, normalize_images, CritiqueRequest, ImageInput, NormalizeWarning},
    session::Session,
    Category, CritiqueError, Mode, PipelineParams, ResponseShape, RoutingTable,
};
use proofit_sdk::LanguageModel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub category: Category,
    #[serde(flatten)]
    pub outcome: CritiqueOutcome,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NormalizeWarning>,
}

/// A new user message in an existing conversation.
#[derive(Debug, Clone, Default)]
pub struct FollowUpMessage {
    pub text: String,
    pub images: Vec<ImageInput>,
}

impl FollowUpMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpResponse {
    pub text: String,
    /// Answered without a model call.
    #[serde(skip)]
    pub local: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NormalizeWarning>,
}

pub struct CritiquePipeline {
    classifier: Classifier,
    generator: CritiqueGenerator,
    cache: ResultCache,
    context_window: usize,
}

impl CritiquePipeline {
    #[must_use]
    pub fn new(params: PipelineParams) -> Self {
        let classifier_model = params
            .classifier_model
            .unwrap_or_else(|| params.model.clone());

        Self {
            classifier: Classifier::new(classifier_model, params.model_timeout),
            generator: CritiqueGenerator::new(
                params.model,
                Arc::new(params.instructions),
                params.model_timeout,
            ),
            cache: ResultCache::new(params.cache_store, params.cache_ttl),
            context_window: params.context_window,
        }
    }

    pub fn builder(model: Arc<dyn LanguageModel>) -> PipelineParams {
        PipelineParams::new(model)
    }

    /// Classify a submission and produce a critique or a plain-text reply.
    /// Identical submissions within the cache TTL are answered from cache.
    pub async fn submit(&self, request: CritiqueRequest) -> Result<SubmitResponse, CritiqueError> {
        trace_submit(self.submit_inner(request)).await
    }

    async fn submit_inner(&self, request: CritiqueRequest) -> Result<SubmitResponse, CritiqueError> {
        let normalized = normalize(request)?;
        let input = &normalized.input;

        let category = self.classifier.classify(input).await?;
        let shape = RoutingTable::route(category, Mode::Critique);
        tracing::info!(category = %category, ?shape, "classified submission");

        let fingerprint = Fingerprint::compute(input, category, Mode::Critique);
        let cached = self
            .cache
            .get_or_compute(&fingerprint, || async move {
                let text = self.generator.generate(category, shape, input).await?;
                Ok::<_, CritiqueError>(parse(&text.0, shape))
            })
            .await?;

        if shape.is_structured() && cached.value.as_critique().is_none() {
            tracing::warn!(category = %category, "structured route produced plain text");
        }

        Ok(SubmitResponse {
            category,
            outcome: cached.value,
            cached: cached.hit,
            warnings: normalized.warnings,
        })
    }

    /// Answer a follow-up turn. Always plain text, never cached.
    pub async fn follow_up(
        &self,
        session: &Session,
        message: FollowUpMessage,
    ) -> Result<FollowUpResponse, CritiqueError> {
        trace_follow_up(self.follow_up_inner(session, message)).await
    }

    async fn follow_up_inner(
        &self,
        session: &Session,
        message: FollowUpMessage,
    ) -> Result<FollowUpResponse, CritiqueError> {
        let text = message.text.trim();
        let (images, warnings) = normalize_images(message.images)?;
        if text.is_empty() && images.is_empty() {
            return Err(CritiqueError::InvalidInput(
                "Follow-up message is empty".to_string(),
            ));
        }

        if is_fix_prompt_request(text) {
            if let Some(critique) = session.latest_critique() {
                tracing::info!("answering fix prompt request locally");
                return Ok(FollowUpResponse {
                    text: build_fix_prompt(critique),
                    local: true,
                    warnings,
                });
            }
        }

        let prompt_context = PromptContext {
            category: session.category.unwrap_or(Category::Unknown),
            shape: ResponseShape::PlainChat,
            goal: session.goal,
            audience: session.audience.clone(),
            platform: session.platform.clone(),
        };
        let context = build_context(
            session,
            text,
            &images,
            self.context_window,
            self.generator.system_prompt(&prompt_context),
        );
        tracing::debug!(messages = context.messages.len(), "built follow-up context");

        let reply = self
            .generator
            .generate_chat(context.system_prompt, context.messages)
            .await?;

        Ok(FollowUpResponse {
            text: reply.0.trim().to_string(),
            local: false,
            warnings,
        })
    }
}
