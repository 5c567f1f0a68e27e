//! Design critique pipeline: classify a UI artifact, generate a structured
//! critique with a language model, validate it, cache it, and hold
//! follow-up conversations about it.

pub mod cache;
mod category;
mod classifier;
mod config;
mod context;
mod errors;
mod fix_prompt;
mod generator;
mod instruction;
mod opentelemetry;
mod params;
mod parser;
mod pipeline;
mod prompts;
pub mod request;
pub mod schema;
pub mod server;
pub mod session;

pub use category::{Category, Mode, ResponseShape, RoutingTable};
pub use classifier::Classifier;
pub use config::{ConfigError, ServerConfig};
pub use context::{build_context, ChatContext, DEFAULT_CONTEXT_WINDOW};
pub use errors::{CritiqueError, ErrorBody};
pub use fix_prompt::{build_fix_prompt, is_fix_prompt_request};
pub use generator::{CritiqueGenerator, ModelText};
pub use instruction::{get_prompt, InstructionParam, PromptContext};
pub use params::{PipelineParams, DEFAULT_MODEL_TIMEOUT};
pub use parser::{parse, CritiqueOutcome};
pub use pipeline::{CritiquePipeline, FollowUpMessage, FollowUpResponse, SubmitResponse};
pub use prompts::default_instructions;
pub use request::{normalize, CritiqueRequest, Goal, ImageInput, NormalizeWarning};
pub use schema::CritiqueResult;
pub use session::Session;
