//! Provider-neutral model transport: message types, the [`LanguageModel`]
//! trait, and an OpenAI Chat Completions client.

mod client_utils;
mod errors;
mod language_model;
mod opentelemetry;
mod types;
mod types_ext;

pub mod openai;
pub mod sdk_test;

pub use errors::*;
pub use language_model::LanguageModel;
pub use types::*;
