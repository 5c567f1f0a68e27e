use crate::{
    instruction::{get_prompt, InstructionParam, PromptContext},
    prompts::default_instructions,
    request::{NormalizedImage, NormalizedInput},
    Category, CritiqueError, ResponseShape,
};
use proofit_sdk::{
    LanguageModel, LanguageModelError, LanguageModelInput, Message, Part, ResponseFormatJson,
    ResponseFormatOption,
};
use std::{sync::Arc, time::Duration};

const STRUCTURED_MAX_TOKENS: u32 = 4096;
const PLAIN_MAX_TOKENS: u32 = 1024;
const CHAT_MAX_TOKENS: u32 = 2048;

/// Raw text of a successful (2xx) model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelText(pub String);

/// Produces the raw text for a request, shaped by the routing decision.
pub struct CritiqueGenerator {
    model: Arc<dyn LanguageModel>,
    instructions: Arc<Vec<InstructionParam<PromptContext>>>,
    timeout: Duration,
}

impl CritiqueGenerator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        instructions: Arc<Vec<InstructionParam<PromptContext>>>,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            instructions,
            timeout,
        }
    }

    /// Build the system prompt for `context`: built-in instructions for its
    /// shape followed by any extra instructions.
    #[must_use]
    pub fn system_prompt(&self, context: &PromptContext) -> String {
        let mut instructions = default_instructions(context.shape);
        instructions.extend(self.instructions.iter().cloned());
        get_prompt(&instructions, context)
    }

    /// One generation for a fresh submission.
    pub async fn generate(
        &self,
        category: Category,
        shape: ResponseShape,
        input: &NormalizedInput,
    ) -> Result<ModelText, CritiqueError> {
        let context = PromptContext {
            category,
            shape,
            goal: input.goal,
            audience: input.audience.clone(),
            platform: input.platform.clone(),
        };

        let (response_format, max_tokens) = if shape.is_structured() {
            (
                ResponseFormatOption::Json(ResponseFormatJson {
                    name: "critique".to_string(),
                    description: Some("A structured design critique".to_string()),
                    schema: None,
                }),
                STRUCTURED_MAX_TOKENS,
            )
        } else {
            (ResponseFormatOption::Text, PLAIN_MAX_TOKENS)
        };

        let model_input = LanguageModelInput {
            system_prompt: Some(self.system_prompt(&context)),
            messages: vec![Message::user(submission_parts(input))],
            response_format: Some(response_format),
            max_tokens: Some(max_tokens),
            ..Default::default()
        };

        generate_text(self.model.as_ref(), model_input, self.timeout)
            .await
            .map(ModelText)
    }

    /// One generation for a follow-up turn. Always plain text.
    pub async fn generate_chat(
        &self,
        system_prompt: String,
        messages: Vec<Message>,
    ) -> Result<ModelText, CritiqueError> {
        let model_input = LanguageModelInput {
            system_prompt: Some(system_prompt),
            messages,
            response_format: Some(ResponseFormatOption::Text),
            max_tokens: Some(CHAT_MAX_TOKENS),
            ..Default::default()
        };

        generate_text(self.model.as_ref(), model_input, self.timeout)
            .await
            .map(ModelText)
    }
}

fn submission_parts(input: &NormalizedInput) -> Vec<Part> {
    let mut parts: Vec<Part> = input.images.iter().map(image_part).collect();

    let artifact = if input.text.is_empty() {
        "(no text provided, analyse the attached screenshot)".to_string()
    } else {
        input.text.clone()
    };
    parts.push(Part::text(format!(
        "Critique this interface.\nGoal: {}\n\n{artifact}",
        input.goal
    )));
    parts
}

pub(crate) fn image_part(image: &NormalizedImage) -> Part {
    Part::image(image.data.clone(), image.media_type.clone())
}

/// Call `model` with an upper bound on latency and return its text.
/// A 2xx response without any text is an upstream failure.
pub(crate) async fn generate_text(
    model: &dyn LanguageModel,
    input: LanguageModelInput,
    timeout: Duration,
) -> Result<String, CritiqueError> {
    let response = tokio::time::timeout(timeout, model.generate(input))
        .await
        .map_err(|_| {
            tracing::warn!(model = %model.model_id(), ?timeout, "model call timed out");
            CritiqueError::GenerationTimeout(timeout)
        })??;

    response.text().ok_or_else(|| {
        CritiqueError::Upstream(LanguageModelError::Invariant(
            model.provider(),
            "response contained no text".to_string(),
        ))
    })
}
