#![allow(dead_code)]

use proofit_critique::{CritiquePipeline, PipelineParams};
use proofit_sdk::sdk_test::{MockGenerateResult, MockLanguageModel};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct Models {
    pub classifier: Arc<MockLanguageModel>,
    pub generator: Arc<MockLanguageModel>,
}

impl Models {
    pub fn new() -> Self {
        Self {
            classifier: Arc::new(MockLanguageModel::new()),
            generator: Arc::new(MockLanguageModel::new()),
        }
    }

    pub fn params(&self) -> PipelineParams {
        CritiquePipeline::builder(self.generator.clone()).classifier_model(self.classifier.clone())
    }

    pub fn pipeline(&self) -> CritiquePipeline {
        self.params().build()
    }

    pub fn classify_as(&self, label: &str) -> &Self {
        self.classifier
            .enqueue_generate(MockGenerateResult::text(json!({ "category": label }).to_string()));
        self
    }

    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.generator.enqueue_generate(MockGenerateResult::text(text));
        self
    }
}

/// A critique for `<button class="px-[13px]">Buy</button>` with one priority
/// pointing at an issue that does not exist.
pub fn button_critique() -> Value {
    json!({
        "schema_version": "1.0.0",
        "mode": "balanced",
        "scores": {
            "overall": 6,
            "visual_design": 5,
            "ux_clarity": 7,
            "accessibility": 4,
            "performance": 9,
            "code_quality": 6,
            "design_system_consistency": 3
        },
        "top_priorities": [
            { "rank": 1, "issue_id": "ISSUE-001", "why_now": "Breaks rhythm", "expected_impact": "Polish" },
            { "rank": 2, "issue_id": "ISSUE-404", "why_now": "Ghost", "expected_impact": "None" },
            { "rank": 3, "issue_id": "ISSUE-002", "why_now": "Keyboard users are stuck", "expected_impact": "Access" }
        ],
        "roast": {
            "one_liner": "13px of padding is a cry for help.",
            "tone_note": "blunt",
            "vibe_tags": ["arbitrary", "almost-there"]
        },
        "issues": [
            {
                "id": "ISSUE-001",
                "category": "tailwind",
                "severity": "P1",
                "confidence": "high",
                "title": "Off-grid horizontal padding",
                "problem": "px-[13px] breaks the 4pt/8pt spacing grid.",
                "fix_steps": ["Replace px-[13px] with px-3"],
                "patch": {
                    "tailwind": [{ "context": "button", "from": "px-[13px]", "to": "px-3", "why": "Stay on the 4pt grid" }],
                    "react": []
                }
            },
            {
                "id": "ISSUE-002",
                "category": "accessibility",
                "severity": "P0",
                "confidence": "medium",
                "title": "No visible focus state",
                "problem": "The button has no focus ring.",
                "fix_steps": ["Add focus-visible:ring-2", "Check contrast of the ring"]
            }
        ],
        "quick_wins": [
            { "title": "Snap padding to px-3", "why": "One class", "steps": ["Edit the class"], "estimated_minutes": 1 }
        ],
        "meta": {
            "generated_at": "2026-01-01T00:00:00Z",
            "confidence": "high",
            "assumptions": ["Tailwind defaults"],
            "limits": []
        }
    })
}

pub fn fenced(value: &Value) -> String {
    format!("Here is the critique:\n```json\n{value}\n```")
}

pub const BUTTON_HTML: &str = r#"<button class="px-[13px]">Buy</button>"#;
