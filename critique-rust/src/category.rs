use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of labels a request can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    UrlOnly,
    HtmlOrCode,
    ImageOnly,
    MixedInput,
    DesignQuestion,
    Unknown,
    ComparisonRequest,
    ScoreOnly,
    FixRequest,
    ValidationCheck,
    DesignSystemQuestion,
    AccessibilityCheck,
    AdjacentConcern,
}

impl Category {
    pub const ALL: [Self; 13] = [
        Self::UrlOnly,
        Self::HtmlOrCode,
        Self::ImageOnly,
        Self::MixedInput,
        Self::DesignQuestion,
        Self::Unknown,
        Self::ComparisonRequest,
        Self::ScoreOnly,
        Self::FixRequest,
        Self::ValidationCheck,
        Self::DesignSystemQuestion,
        Self::AccessibilityCheck,
        Self::AdjacentConcern,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UrlOnly => "url_only",
            Self::HtmlOrCode => "html_or_code",
            Self::ImageOnly => "image_only",
            Self::MixedInput => "mixed_input",
            Self::DesignQuestion => "design_question",
            Self::Unknown => "unknown",
            Self::ComparisonRequest => "comparison_request",
            Self::ScoreOnly => "score_only",
            Self::FixRequest => "fix_request",
            Self::ValidationCheck => "validation_check",
            Self::DesignSystemQuestion => "design_system_question",
            Self::AccessibilityCheck => "accessibility_check",
            Self::AdjacentConcern => "adjacent_concern",
        }
    }

    /// Match a label verbatim. Casing, whitespace and extra text are not
    /// forgiven.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a call belongs to a fresh submission or a follow-up turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Critique,
    Chat,
}

impl Mode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critique => "critique",
            Self::Chat => "chat",
        }
    }
}

/// What the generator must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// A full JSON critique.
    Structured,
    /// One observation plus a request for exactly one artifact.
    PlainClarify,
    /// Two options and a single disambiguating question.
    PlainBoundary,
    /// Conversational follow-up text.
    PlainChat,
}

impl ResponseShape {
    #[must_use]
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Structured)
    }
}

pub struct RoutingTable;

impl RoutingTable {
    /// Critique-mode routes. Every category appears exactly once.
    pub const CRITIQUE: [(Category, ResponseShape); 13] = [
        (Category::UrlOnly, ResponseShape::Structured),
        (Category::HtmlOrCode, ResponseShape::Structured),
        (Category::ImageOnly, ResponseShape::Structured),
        (Category::MixedInput, ResponseShape::Structured),
        (Category::ComparisonRequest, ResponseShape::Structured),
        (Category::ScoreOnly, ResponseShape::Structured),
        (Category::FixRequest, ResponseShape::Structured),
        (Category::ValidationCheck, ResponseShape::Structured),
        (Category::DesignSystemQuestion, ResponseShape::Structured),
        (Category::AccessibilityCheck, ResponseShape::Structured),
        (Category::DesignQuestion, ResponseShape::PlainClarify),
        (Category::Unknown, ResponseShape::PlainClarify),
        (Category::AdjacentConcern, ResponseShape::PlainBoundary),
    ];

    #[must_use]
    pub fn route(category: Category, mode: Mode) -> ResponseShape {
        match mode {
            Mode::Chat => ResponseShape::PlainChat,
            Mode::Critique => Self::CRITIQUE
                .iter()
                .find(|(routed, _)| *routed == category)
                .map_or(ResponseShape::PlainClarify, |(_, shape)| *shape),
        }
    }
}
