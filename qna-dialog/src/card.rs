//! Active-learning card builder and answer rendering.

use std::cmp::Ordering;

use qna_service::ScoredAnswer;

use crate::activity::{ChoiceCard, OutboundActivity};
use crate::options::DialogOptions;
use crate::turn_state::PendingCandidate;

/// Longest label shown on a card, in characters.
pub const MAX_LABEL_CHARS: usize = 100;

/// A clarification card and the candidates behind its options.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLearningCard {
    pub card: ChoiceCard,
    /// One entry per candidate option, same order as the card, without the
    /// trailing no-match option.
    pub candidates: Vec<PendingCandidate>,
}

/// Builds the "Did you mean" card for an ambiguous set of candidates.
///
/// Candidates are ordered by descending score (stable, so equal scores keep
/// scorer order), deduplicated by trimmed text keeping the higher score, and
/// cut to `max_options`. Every kept candidate gets its own label; labels that
/// would collide are suffixed with ` (2)`, ` (3)` and so on. The
/// `no_match_text` option is always appended last.
pub fn build_active_learning_card(
    candidates: &[ScoredAnswer],
    max_options: usize,
    title: &str,
    no_match_text: &str,
) -> ActiveLearningCard {
    let mut ordered: Vec<&ScoredAnswer> = candidates.iter().collect();
    ordered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let no_match = no_match_text.trim();
    let mut pending: Vec<PendingCandidate> = Vec::with_capacity(max_options);
    for answer in ordered {
        if pending.len() == max_options {
            break;
        }
        let text = answer.text.trim();
        if text.is_empty() || pending.iter().any(|p| p.answer.text.trim() == text) {
            continue;
        }
        let label = distinct_label(text, |label| {
            label == no_match || pending.iter().any(|p| p.label == label)
        });
        pending.push(PendingCandidate {
            label,
            answer: answer.clone(),
        });
    }

    let mut options: Vec<String> = pending.iter().map(|p| p.label.clone()).collect();
    options.push(no_match.to_string());

    ActiveLearningCard {
        card: ChoiceCard {
            title: title.to_string(),
            options,
        },
        candidates: pending,
    }
}

/// Single-line label of at most [`MAX_LABEL_CHARS`] characters.
pub fn display_label(text: &str) -> String {
    shorten(&flatten(text), MAX_LABEL_CHARS)
}

/// First label for `text` that `taken` rejects, numbering from ` (2)`.
fn distinct_label(text: &str, taken: impl Fn(&str) -> bool) -> String {
    let label = display_label(text);
    if !taken(&label) {
        return label;
    }
    let flat = flatten(text);
    (2usize..)
        .map(|n| {
            let suffix = format!(" ({n})");
            let mut label = shorten(&flat, MAX_LABEL_CHARS - suffix.chars().count());
            label.push_str(&suffix);
            label
        })
        .find(|label| !taken(label))
        .unwrap_or(label)
}

fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn shorten(flat: &str, max_chars: usize) -> String {
    if flat.chars().count() <= max_chars {
        return flat.to_string();
    }
    let mut cut: String = flat.chars().take(max_chars - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

/// Renders an accepted answer, honoring the precise-answer options and
/// attaching follow-up prompts ordered by display order.
pub fn render_answer(answer: &ScoredAnswer, options: &DialogOptions) -> OutboundActivity {
    let prompts = answer
        .prompts()
        .into_iter()
        .map(|p| p.display_text)
        .collect();

    let span = answer
        .precise_answer
        .as_ref()
        .filter(|_| options.precise_answer_enabled)
        .map(|p| p.text.trim())
        .filter(|t| !t.is_empty());

    match span {
        Some(span) if options.precise_answer_only => OutboundActivity::Message {
            text: span.to_string(),
            detail: None,
            prompts,
        },
        Some(span) => OutboundActivity::Message {
            text: span.to_string(),
            detail: Some(answer.text.clone()),
            prompts,
        },
        None => OutboundActivity::Message {
            text: answer.text.clone(),
            detail: None,
            prompts,
        },
    }
}
