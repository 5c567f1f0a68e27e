use super::api::{
    ChatCompletion, ChatCompletionAssistantMessageParam, ChatCompletionContentPart,
    ChatCompletionContentPartImage, ChatCompletionContentPartImageUrl,
    ChatCompletionContentPartText, ChatCompletionCreateParams, ChatCompletionMessageParam,
    ChatCompletionSystemMessageParam, ChatCompletionUserMessageParam, CompletionUsage,
    ResponseFormat, ResponseFormatJSONSchema, ResponseFormatJSONSchemaContent,
};
use crate::{
    client_utils, LanguageModel, LanguageModelError, LanguageModelInput, LanguageModelResult,
    Message, ModelResponse, ModelUsage, Part, ResponseFormatOption,
};
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Client,
};
use std::collections::HashMap;

const PROVIDER: &str = "openai";

pub struct OpenAIChatModel {
    model_id: String,
    api_key: String,
    base_url: String,
    client: Client,
    headers: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct OpenAIChatModelOptions {
    pub base_url: Option<String>,
    pub api_key: String,
    pub headers: Option<HashMap<String, String>>,
    pub client: Option<Client>,
}

impl OpenAIChatModel {
    #[must_use]
    pub fn new(model_id: impl Into<String>, options: OpenAIChatModelOptions) -> Self {
        let OpenAIChatModelOptions {
            base_url,
            api_key,
            headers,
            client,
        } = options;

        let base_url = base_url
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        let client = client.unwrap_or_else(Client::new);
        let headers = headers.unwrap_or_default();

        Self {
            model_id: model_id.into(),
            api_key,
            base_url,
            client,
            headers,
        }
    }

    fn request_headers(&self) -> LanguageModelResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let mut auth_header =
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid OpenAI API key header value: {error}"
                ))
            })?;
        auth_header.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_header);

        for (key, value) in &self.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid OpenAI header name '{key}': {error}"
                ))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid OpenAI header value for '{key}': {error}"
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl LanguageModel for OpenAIChatModel {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model_id(&self) -> String {
        self.model_id.clone()
    }

    async fn generate(&self, input: LanguageModelInput) -> LanguageModelResult<ModelResponse> {
        crate::opentelemetry::trace_generate(PROVIDER, &self.model_id, input, |input| async move {
            let request = convert_to_openai_create_params(input, &self.model_id)?;
            let headers = self.request_headers()?;

            let response: ChatCompletion = client_utils::send_json(
                &self.client,
                &format!("{}/chat/completions", self.base_url),
                &request,
                headers,
            )
            .await?;

            map_openai_completion(response)
        })
        .await
    }
}

fn convert_to_openai_create_params(
    input: LanguageModelInput,
    model_id: &str,
) -> LanguageModelResult<ChatCompletionCreateParams> {
    let LanguageModelInput {
        system_prompt,
        messages,
        response_format,
        max_tokens,
        temperature,
        top_p,
        seed,
        metadata: _,
    } = input;

    Ok(ChatCompletionCreateParams {
        model: model_id.to_string(),
        messages: convert_to_openai_messages(system_prompt, messages)?,
        max_tokens,
        temperature,
        top_p,
        seed,
        response_format: response_format.map(convert_to_openai_response_format),
    })
}

fn convert_to_openai_messages(
    system_prompt: Option<String>,
    messages: Vec<Message>,
) -> LanguageModelResult<Vec<ChatCompletionMessageParam>> {
    let mut openai_messages = vec![];

    if let Some(system_prompt) = system_prompt {
        openai_messages.push(ChatCompletionMessageParam::System(
            ChatCompletionSystemMessageParam {
                content: system_prompt,
            },
        ));
    }

    for message in messages {
        match message {
            Message::User(message) => {
                let content = message
                    .content
                    .into_iter()
                    .map(|part| match part {
                        Part::Text(part) => {
                            ChatCompletionContentPart::Text(ChatCompletionContentPartText {
                                text: part.text,
                            })
                        }
                        Part::Image(part) => {
                            ChatCompletionContentPart::Image(ChatCompletionContentPartImage {
                                image_url: ChatCompletionContentPartImageUrl {
                                    url: part.to_data_url(),
                                },
                            })
                        }
                    })
                    .collect();
                openai_messages.push(ChatCompletionMessageParam::User(
                    ChatCompletionUserMessageParam { content },
                ));
            }
            Message::Assistant(message) => {
                let mut text = String::new();
                for part in message.content {
                    match part {
                        Part::Text(part) => text.push_str(&part.text),
                        Part::Image(_) => {
                            return Err(LanguageModelError::Unsupported(
                                PROVIDER,
                                "Cannot convert image part in assistant message".to_string(),
                            ));
                        }
                    }
                }
                openai_messages.push(ChatCompletionMessageParam::Assistant(
                    ChatCompletionAssistantMessageParam { content: text },
                ));
            }
        }
    }

    Ok(openai_messages)
}

fn convert_to_openai_response_format(response_format: ResponseFormatOption) -> ResponseFormat {
    match response_format {
        ResponseFormatOption::Text => ResponseFormat::Text,
        ResponseFormatOption::Json(format) => match format.schema {
            Some(schema) => ResponseFormat::JSONSchema(ResponseFormatJSONSchema {
                json_schema: ResponseFormatJSONSchemaContent {
                    name: format.name,
                    description: format.description,
                    schema,
                    strict: true,
                },
            }),
            None => ResponseFormat::JSONObject,
        },
    }
}

fn map_openai_completion(response: ChatCompletion) -> LanguageModelResult<ModelResponse> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        LanguageModelError::Invariant(PROVIDER, "No choices in response".to_string())
    })?;

    let message = choice.message;

    if let Some(refusal) = message.refusal {
        if !refusal.is_empty() {
            return Err(LanguageModelError::Refusal(refusal));
        }
    }

    let content = message
        .content
        .filter(|text| !text.is_empty())
        .map(|text| vec![Part::text(text)])
        .unwrap_or_default();

    Ok(ModelResponse {
        content,
        usage: response.usage.map(map_openai_usage),
    })
}

fn map_openai_usage(usage: CompletionUsage) -> ModelUsage {
    ModelUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImagePart, ResponseFormatJson};
    use serde_json::json;

    #[test]
    fn converts_text_and_image_parts_into_chat_params() {
        let input = LanguageModelInput {
            system_prompt: Some("You critique interfaces.".to_string()),
            messages: vec![
                Message::user(vec![
                    Part::text("Roast this"),
                    Part::Image(ImagePart::new("aGVsbG8=", "image/png")),
                ]),
                Message::assistant(vec![Part::text("Send the code.")]),
            ],
            response_format: Some(ResponseFormatOption::Json(ResponseFormatJson {
                name: "critique".to_string(),
                description: None,
                schema: None,
            })),
            temperature: Some(0.0),
            ..Default::default()
        };

        let params = convert_to_openai_create_params(input, "gpt-4o").unwrap();
        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "gpt-4o",
                "messages": [
                    { "role": "system", "content": "You critique interfaces." },
                    {
                        "role": "user",
                        "content": [
                            { "type": "text", "text": "Roast this" },
                            { "type": "image_url", "image_url": { "url": "data:image/png;base64,aGVsbG8=" } }
                        ]
                    },
                    { "role": "assistant", "content": "Send the code." }
                ],
                "temperature": 0.0,
                "response_format": { "type": "json_object" }
            })
        );
    }

    #[test]
    fn rejects_image_in_assistant_message() {
        let result = convert_to_openai_messages(
            None,
            vec![Message::assistant(vec![Part::image("aGVsbG8=", "image/png")])],
        );
        assert!(matches!(
            result,
            Err(LanguageModelError::Unsupported(PROVIDER, _))
        ));
    }

    #[test]
    fn maps_completion_text_usage_and_refusal() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "{\"category\":\"unknown\"}" }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5 }
        }))
        .unwrap();
        let response = map_openai_completion(completion).unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"category\":\"unknown\"}"));
        assert_eq!(
            response.usage,
            Some(ModelUsage {
                input_tokens: 12,
                output_tokens: 5
            })
        );

        let refused: ChatCompletion = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null, "refusal": "I can't help with that." } }]
        }))
        .unwrap();
        assert!(matches!(
            map_openai_completion(refused),
            Err(LanguageModelError::Refusal(_))
        ));

        let empty: ChatCompletion = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            map_openai_completion(empty),
            Err(LanguageModelError::Invariant(PROVIDER, _))
        ));
    }
}
