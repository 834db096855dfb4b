//! Ranked-answer dialog.
//!
//! [`AnswerDialog`] sends each utterance to an [`qna_service::AnswerScorer`]
//! and answers directly, asks the user to pick between close candidates
//! (active learning), or falls back to a default text. Pending choices and
//! follow-up prompts are kept in a per-conversation [`TurnState`].

pub mod activity;
pub mod card;
pub mod decision;
pub mod dialog;
pub mod errors;
pub mod options;
pub mod turn_state;

pub use activity::{Activity, ActivityType, ChannelAccount, ChoiceCard, ConversationAccount, OutboundActivity};
pub use card::{ActiveLearningCard, build_active_learning_card, render_answer};
pub use decision::{Decision, decide};
pub use dialog::{AnswerDialog, DialogTurn, pending_labels};
pub use errors::DialogError;
pub use options::DialogOptions;
pub use turn_state::{DialogCursor, FollowUpState, PendingCandidate, TURN_STATE_PROPERTY, TurnState};
