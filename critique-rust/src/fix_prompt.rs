use crate::schema::{format_score, CritiqueResult};
use regex::Regex;
use std::{fmt::Write, sync::LazyLock};

static FIX_PROMPT_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)generate.*prompt|create.*prompt|get.*prompt|prompt.*this|fix.*prompt")
        .expect("fix prompt pattern is valid")
});

/// Whether a follow-up asks for a copy-pasteable prompt to apply the fixes.
#[must_use]
pub fn is_fix_prompt_request(text: &str) -> bool {
    FIX_PROMPT_REQUEST.is_match(text)
}

/// A prompt for a coding assistant that applies every issue of `critique`.
#[must_use]
pub fn build_fix_prompt(critique: &CritiqueResult) -> String {
    let mut prompt = String::from(
        "You are an expert frontend developer and designer. Apply the design critique below to my React/Tailwind code.\n\n",
    );

    let _ = writeln!(prompt, "CRITIQUE SUMMARY:\n{}\n", critique.roast.one_liner);

    let scores = &critique.scores;
    let _ = writeln!(
        prompt,
        "SCORES:\n- Overall: {}/10\n- Visual Design: {}/10\n- UX Clarity: {}/10\n- Accessibility: {}/10\n- Code Quality: {}/10\n",
        format_score(scores.overall),
        format_score(scores.visual_design),
        format_score(scores.ux_clarity),
        format_score(scores.accessibility),
        format_score(scores.code_quality),
    );

    let _ = writeln!(
        prompt,
        "ISSUES TO ADDRESS ({} total):",
        critique.issues.len()
    );
    for (number, issue) in (1..).zip(&critique.issues) {
        let _ = writeln!(
            prompt,
            "{number}. [{:?}] {} ({})\n   Problem: {}\n   Fix steps:",
            issue.severity,
            issue.title,
            issue.category.as_str().to_uppercase(),
            issue.problem
        );
        for (step_number, step) in (1..).zip(&issue.fix_steps) {
            let _ = writeln!(prompt, "      {step_number}. {step}");
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "REQUIREMENTS:\n\
         1. Apply every fix step listed above.\n\
         2. Keep the existing design language and component structure.\n\
         3. Use Tailwind utility classes on the default scale; no arbitrary values.\n\
         4. Do not regress accessibility.\n\
         5. Return the complete updated code with brief comments on each change.",
    );
    prompt
}
