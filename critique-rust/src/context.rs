use crate::{
    generator::image_part,
    request::NormalizedImage,
    schema::{format_score, CritiqueResult},
    session::{Role, Session, TurnContent},
};
use proofit_sdk::{Message, Part};

/// Default number of replayed turns.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Grounding issue titles carried by the synthetic critique line.
const SUMMARY_ISSUE_TITLES: usize = 3;

/// What a follow-up generation is conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub system_prompt: String,
    pub messages: Vec<Message>,
}

struct Entry {
    role: Role,
    text: String,
    images: Vec<NormalizedImage>,
}

/// Assemble the history for a follow-up turn.
///
/// The first user turn (the submission that was classified) is never
/// replayed, structured critiques are compressed to a one-line summary,
/// consecutive turns with the same role are merged, and only the last
/// `window` turns survive. The emitted sequence starts with a user message,
/// alternates strictly, and ends with `new_text`.
#[must_use]
pub fn build_context(
    session: &Session,
    new_text: &str,
    new_images: &[NormalizedImage],
    window: usize,
    system_prompt: String,
) -> ChatContext {
    let first_user = session
        .turns()
        .iter()
        .position(|turn| turn.role == Role::User);

    let mut history: Vec<Entry> = vec![];
    for (index, turn) in session.turns().iter().enumerate() {
        if Some(index) == first_user {
            continue;
        }
        let text = match &turn.content {
            TurnContent::Text(text) => text.clone(),
            TurnContent::Critique(critique) => format!("Previous critique: {}", critique.summary()),
        };
        let images = if turn.role == Role::User {
            turn.attachments.clone()
        } else {
            vec![]
        };
        push_merged(&mut history, turn.role, text, images);
    }

    drop_leading_agent(&mut history);
    if history.len() > window {
        history.drain(..history.len() - window);
        drop_leading_agent(&mut history);
    }

    let mut text = new_text.to_string();
    if history.is_empty() {
        if let Some(critique) = session.latest_critique() {
            text.push_str("\n\n");
            text.push_str(&grounding_line(critique));
        }
    }
    push_merged(&mut history, Role::User, text, new_images.to_vec());

    ChatContext {
        system_prompt,
        messages: history.into_iter().map(into_message).collect(),
    }
}

fn push_merged(history: &mut Vec<Entry>, role: Role, text: String, images: Vec<NormalizedImage>) {
    match history.last_mut() {
        Some(last) if last.role == role => {
            if !text.is_empty() {
                if !last.text.is_empty() {
                    last.text.push_str("\n\n");
                }
                last.text.push_str(&text);
            }
            last.images.extend(images);
        }
        _ => history.push(Entry { role, text, images }),
    }
}

fn drop_leading_agent(history: &mut Vec<Entry>) {
    let leading = history
        .iter()
        .take_while(|entry| entry.role == Role::Agent)
        .count();
    history.drain(..leading);
}

fn grounding_line(critique: &CritiqueResult) -> String {
    let titles = critique
        .issues
        .iter()
        .take(SUMMARY_ISSUE_TITLES)
        .map(|issue| issue.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Previous critique summary:\n- Overall score: {}/10\n- Roast: \"{}\"\n- Issues found: {}\n- Key issues: {titles}",
        format_score(critique.scores.overall),
        critique.roast.one_liner,
        critique.issues.len()
    )
}

fn into_message(entry: Entry) -> Message {
    match entry.role {
        Role::User => {
            let mut parts: Vec<Part> = entry.images.iter().map(image_part).collect();
            parts.push(Part::text(entry.text));
            Message::user(parts)
        }
        Role::Agent => Message::assistant(vec![Part::text(entry.text)]),
    }
}
