//! Typed form of the structured critique the generator emits.
//!
//! Only `schema_version`, `scores.overall`, `roast.one_liner` and the issue
//! essentials are required. Everything else defaults so that a model which
//! skips an optional block still yields a usable critique. Unknown top-level
//! blocks are kept verbatim in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Inclusive bounds of every score.
pub const SCORE_RANGE: (f64, f64) = (0.0, 10.0);

/// Whether `version` belongs to the supported major line.
#[must_use]
pub fn is_supported_version(version: &str) -> bool {
    version.split('.').next() == Some("1")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueResult {
    pub schema_version: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Inputs>,
    pub scores: Scores,
    #[serde(default)]
    pub top_priorities: Vec<Priority>,
    pub roast: Roast,
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub quick_wins: Vec<QuickWin>,
    #[serde(default)]
    pub systemic_fixes: Vec<SystemicFix>,
    #[serde(default)]
    pub verification: Vec<VerifyStep>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CritiqueResult {
    #[must_use]
    pub fn issue(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    /// One-line summary used wherever a critique is replayed as text.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "overall {}/10, {} issues",
            format_score(self.scores.overall),
            self.issues.len()
        )
    }
}

fn default_mode() -> String {
    "balanced".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
    pub framework: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inputs {
    pub goal: String,
    pub audience: String,
    pub primary_action: String,
    pub platform: String,
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub overall: f64,
    #[serde(default)]
    pub visual_design: f64,
    #[serde(default)]
    pub ux_clarity: f64,
    #[serde(default)]
    pub accessibility: f64,
    #[serde(default)]
    pub performance: f64,
    #[serde(default)]
    pub code_quality: f64,
    #[serde(default)]
    pub design_system_consistency: f64,
}

impl Scores {
    /// Clamp every score into [`SCORE_RANGE`]. Returns whether anything changed.
    pub fn clamp(&mut self) -> bool {
        let (min, max) = SCORE_RANGE;
        let mut changed = false;
        for score in [
            &mut self.overall,
            &mut self.visual_design,
            &mut self.ux_clarity,
            &mut self.accessibility,
            &mut self.performance,
            &mut self.code_quality,
            &mut self.design_system_consistency,
        ] {
            let clamped = if score.is_nan() { min } else { score.clamp(min, max) };
            if (clamped - *score).abs() > f64::EPSILON || score.is_nan() {
                *score = clamped;
                changed = true;
            }
        }
        changed
    }
}

/// Render a score without a trailing `.0`.
#[must_use]
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priority {
    #[serde(deserialize_with = "lenient_rank")]
    pub rank: u32,
    pub issue_id: String,
    #[serde(default)]
    pub why_now: String,
    #[serde(default)]
    pub expected_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roast {
    pub one_liner: String,
    #[serde(default = "default_tone_note")]
    pub tone_note: String,
    #[serde(default)]
    pub vibe_tags: Vec<String>,
}

/// Accept any JSON number as a rank. Fractions round to the nearest whole
/// rank and negatives become 0; ranks are renumbered after parsing anyway.
fn lenient_rank<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let rank = f64::deserialize(deserializer)?;
    if rank.is_nan() || rank <= 0.0 {
        return Ok(0);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(rank.round().min(f64::from(u32::MAX)) as u32)
}

fn default_tone_note() -> String {
    "sharp_but_fair".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    P0,
    P1,
    P2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Visual,
    Ux,
    Accessibility,
    Performance,
    Maintainability,
    Code,
    ReactNext,
    Tailwind,
    #[serde(other)]
    Other,
}

impl IssueCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Ux => "ux",
            Self::Accessibility => "accessibility",
            Self::Performance => "performance",
            Self::Maintainability => "maintainability",
            Self::Code => "code",
            Self::ReactNext => "react_next",
            Self::Tailwind => "tailwind",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub category: IssueCategory,
    pub severity: Severity,
    #[serde(default)]
    pub confidence: Confidence,
    pub title: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub fix_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Patch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<Principle>,
    #[serde(default)]
    pub verify: Vec<VerifyStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patch {
    pub tailwind: Vec<TailwindSwap>,
    pub react: Vec<CodeSnippet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailwindSwap {
    pub context: String,
    pub from: String,
    pub to: String,
    pub why: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSnippet {
    pub language: String,
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Principle {
    pub name: String,
    pub explanation: String,
    pub sources: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyStep {
    pub step: String,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickWin {
    pub title: String,
    #[serde(default)]
    pub why: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub estimated_minutes: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemicFix {
    pub title: String,
    pub problem: String,
    pub recommendation: String,
    pub policy: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub generated_at: String,
    pub confidence: Confidence,
    pub assumptions: Vec<String>,
    pub limits: Vec<String>,
}
