//! Streamed question answering: marker extraction and the per-question
//! state machine.

mod controller;
mod extract;
mod stream;

pub use controller::{AnswerController, AnswerSnapshot, AnswerState};
pub use extract::{AnswerExtractor, ExtractMode, MARKER, MAX_OPEN_VALUE};
pub(crate) use stream::answer_updates;
