use crate::{
    generator::{generate_text, image_part},
    prompts::classifier_prompt,
    request::NormalizedInput,
    Category, CritiqueError,
};
use proofit_sdk::{
    LanguageModel, LanguageModelInput, Message, Part, ResponseFormatJson, ResponseFormatOption,
};
use serde::Deserialize;
use std::{fmt::Write, sync::Arc, time::Duration};

/// Characters of submitted text shown to the classifier.
const TEXT_PREFIX_CHARS: usize = 500;
const MAX_TOKENS: u32 = 100;

#[derive(Deserialize)]
struct LabelReply {
    category: String,
}

pub struct Classifier {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl Classifier {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Assign exactly one category. A reply that is not a known label resolves
    /// to [`Category::Unknown`]; only transport failures and timeouts error.
    pub async fn classify(&self, input: &NormalizedInput) -> Result<Category, CritiqueError> {
        let model_input = LanguageModelInput {
            system_prompt: Some(classifier_prompt().to_string()),
            messages: vec![Message::user(classifier_parts(input))],
            response_format: Some(ResponseFormatOption::Json(ResponseFormatJson {
                name: "classification".to_string(),
                description: None,
                schema: None,
            })),
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(0.0),
            ..Default::default()
        };

        let reply = generate_text(self.model.as_ref(), model_input, self.timeout).await?;

        Ok(parse_label(&reply).unwrap_or_else(|| {
            tracing::debug!(reply = %reply, "unrecognised classification, falling back to unknown");
            Category::Unknown
        }))
    }
}

fn classifier_parts(input: &NormalizedInput) -> Vec<Part> {
    let mut text: String = input.text.chars().take(TEXT_PREFIX_CHARS).collect();
    if text.is_empty() {
        text.push_str("(no text)");
    }
    if !input.images.is_empty() {
        let _ = write!(text, "\n[{} image(s) attached]", input.images.len());
    }
    let _ = write!(text, "\nGoal: {}", input.goal);
    if let Some(audience) = &input.audience {
        let _ = write!(text, "\nAudience: {audience}");
    }
    if let Some(platform) = &input.platform {
        let _ = write!(text, "\nPlatform: {platform}");
    }

    let mut parts = vec![Part::text(text)];
    if let Some(image) = input.images.first() {
        parts.push(image_part(image));
    }
    parts
}

/// Accept a bare label or `{"category": "<label>"}`, possibly fenced.
fn parse_label(reply: &str) -> Option<Category> {
    let reply = reply.trim();
    if let Some(category) = Category::from_label(reply) {
        return Some(category);
    }

    let unfenced = reply
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str::<LabelReply>(unfenced)
        .ok()
        .and_then(|parsed| Category::from_label(&parsed.category))
}
