use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionCreateParams {
    #[serde(rename = "model")]
    pub model: String,
    #[serde(rename = "messages")]
    pub messages: Vec<ChatCompletionMessageParam>,
    #[serde(rename = "max_tokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(rename = "temperature", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "top_p", skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(rename = "seed", skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(rename = "response_format", skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum ChatCompletionMessageParam {
    #[serde(rename = "system")]
    System(ChatCompletionSystemMessageParam),
    #[serde(rename = "user")]
    User(ChatCompletionUserMessageParam),
    #[serde(rename = "assistant")]
    Assistant(ChatCompletionAssistantMessageParam),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionSystemMessageParam {
    #[serde(rename = "content")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionUserMessageParam {
    #[serde(rename = "content")]
    pub content: Vec<ChatCompletionContentPart>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionAssistantMessageParam {
    #[serde(rename = "content")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ChatCompletionContentPart {
    #[serde(rename = "text")]
    Text(ChatCompletionContentPartText),
    #[serde(rename = "image_url")]
    Image(ChatCompletionContentPartImage),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionContentPartText {
    #[serde(rename = "text")]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionContentPartImage {
    #[serde(rename = "image_url")]
    pub image_url: ChatCompletionContentPartImageUrl,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionContentPartImageUrl {
    #[serde(rename = "url")]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ResponseFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json_object")]
    JSONObject,
    #[serde(rename = "json_schema")]
    JSONSchema(ResponseFormatJSONSchema),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ResponseFormatJSONSchema {
    #[serde(rename = "json_schema")]
    pub json_schema: ResponseFormatJSONSchemaContent,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ResponseFormatJSONSchemaContent {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "schema")]
    pub schema: Value,
    #[serde(rename = "strict")]
    pub strict: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(rename = "choices")]
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(rename = "usage", default)]
    pub usage: Option<CompletionUsage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    #[serde(rename = "message")]
    pub message: ChatCompletionMessage,
    #[serde(rename = "finish_reason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    #[serde(rename = "content", default)]
    pub content: Option<String>,
    #[serde(rename = "refusal", default)]
    pub refusal: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionUsage {
    #[serde(rename = "prompt_tokens")]
    pub prompt_tokens: u32,
    #[serde(rename = "completion_tokens")]
    pub completion_tokens: u32,
}
