mod common;

use common::{button_critique, BUTTON_HTML};
use proofit_critique::{
    build_context,
    request::{normalize, NormalizedImage},
    session::Role,
    Category, CritiqueOutcome, CritiqueRequest, CritiqueResult, Goal, Session,
};
use proofit_sdk::{Message, Part};

fn critique() -> CritiqueResult {
    serde_json::from_value(button_critique()).expect("valid critique")
}

fn critiqued_session() -> Session {
    let normalized = normalize(CritiqueRequest::text(BUTTON_HTML)).expect("valid request");
    Session::from_submission(
        &normalized.input,
        Category::HtmlOrCode,
        &CritiqueOutcome::Critique(Box::new(critique())),
    )
}

fn texts(messages: &[Message]) -> Vec<(bool, String)> {
    messages
        .iter()
        .map(|message| {
            let text = message
                .content()
                .iter()
                .filter_map(Part::as_text)
                .collect::<String>();
            (message.is_user(), text)
        })
        .collect()
}

#[test]
fn merges_messy_history_into_strict_alternation() {
    let mut session = critiqued_session();
    session.push_user("a", vec![]);
    session.push_user("b", vec![]);
    session.push_agent_text("x");
    session.push_agent_text("y");
    session.push_user("c", vec![]);

    let context = build_context(&session, "d", &[], 10, "system".to_string());

    assert_eq!(context.system_prompt, "system");
    assert_eq!(
        texts(&context.messages),
        vec![
            (true, "a\n\nb".to_string()),
            (false, "x\n\ny".to_string()),
            (true, "c\n\nd".to_string()),
        ]
    );
}

#[test]
fn never_replays_the_original_submission() {
    let session = critiqued_session();
    let context = build_context(&session, "why?", &[], 10, String::new());

    assert_eq!(context.messages.len(), 1);
    let (_, text) = &texts(&context.messages)[0];
    assert!(!text.contains(BUTTON_HTML));
}

#[test]
fn first_follow_up_carries_a_critique_summary() {
    let session = critiqued_session();
    let context = build_context(&session, "next", &[], 10, String::new());

    assert_eq!(
        texts(&context.messages),
        vec![(
            true,
            "next\n\nPrevious critique summary:\n- Overall score: 6/10\n- Roast: \"13px of padding is a cry for help.\"\n- Issues found: 2\n- Key issues: Off-grid horizontal padding, No visible focus state".to_string()
        )]
    );
}

#[test]
fn compresses_critiques_to_a_summary_line() {
    let mut session = Session::new(Goal::Utility);
    session.push_user("help", vec![]);
    session.push_agent_text("Share the component code.");
    session.push_user(BUTTON_HTML, vec![]);
    session.push_agent_critique(critique());

    let context = build_context(&session, "why?", &[], 10, String::new());

    assert_eq!(
        texts(&context.messages),
        vec![
            (true, BUTTON_HTML.to_string()),
            (false, "Previous critique: overall 6/10, 2 issues".to_string()),
            (true, "why?".to_string()),
        ]
    );
}

#[test]
fn keeps_only_the_most_recent_turns() {
    let mut session = critiqued_session();
    for index in 0..6 {
        session.push_user(format!("q{index}"), vec![]);
        session.push_agent_text(format!("a{index}"));
    }

    let context = build_context(&session, "new", &[], 4, String::new());
    assert_eq!(
        texts(&context.messages),
        vec![
            (true, "q4".to_string()),
            (false, "a4".to_string()),
            (true, "q5".to_string()),
            (false, "a5".to_string()),
            (true, "new".to_string()),
        ]
    );

    let context = build_context(&session, "new", &[], 3, String::new());
    let messages = texts(&context.messages);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], (true, "q5".to_string()));
}

#[test]
fn new_images_precede_the_new_text() {
    let session = Session::new(Goal::Conversion).with_turns(vec![]);
    let image = NormalizedImage {
        media_type: "image/jpeg".to_string(),
        data: "AAAA".to_string(),
    };

    let context = build_context(&session, "look", std::slice::from_ref(&image), 10, String::new());

    assert_eq!(context.messages.len(), 1);
    let content = context.messages[0].content();
    assert_eq!(content[0], Part::image("AAAA", "image/jpeg"));
    assert_eq!(content[1].as_text(), Some("look"));
}

#[test]
fn session_round_trips_through_json() {
    let mut session = critiqued_session();
    session.push_user("why?", vec![]);

    let json = serde_json::to_value(&session).expect("serialize");
    assert_eq!(json["turns"][0]["role"], "user");
    assert_eq!(json["turns"][1]["content"]["schema_version"], "1.0.0");

    let restored: Session = serde_json::from_value(json).expect("deserialize");
    assert_eq!(restored, session);
    assert_eq!(restored.turns()[2].role, Role::User);
    assert!(restored.latest_critique().is_some());
}
