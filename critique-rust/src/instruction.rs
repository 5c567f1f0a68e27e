use crate::{Category, Goal, ResponseShape};

/// Everything an instruction may depend on when a system prompt is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub category: Category,
    pub shape: ResponseShape,
    pub goal: Goal,
    pub audience: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone)]
pub enum InstructionParam<TCtx> {
    String(String),
    Func(fn(&TCtx) -> String),
}

impl<TCtx> InstructionParam<TCtx> {
    pub fn as_string(&self, context: &TCtx) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Func(f) => f(context),
        }
    }
}

impl<TCtx> From<&str> for InstructionParam<TCtx> {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl<TCtx> From<String> for InstructionParam<TCtx> {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<TCtx> From<fn(&TCtx) -> String> for InstructionParam<TCtx> {
    fn from(value: fn(&TCtx) -> String) -> Self {
        Self::Func(value)
    }
}

/// Render instructions in order, one per line. Empty renders are skipped.
pub fn get_prompt<TCtx>(instructions: &[InstructionParam<TCtx>], context: &TCtx) -> String {
    instructions
        .iter()
        .map(|param| param.as_string(context))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
