//! Answer generation over retrieved document context.

pub mod ask;
pub mod simplify;
pub mod types;

pub use ask::AnswerOrchestrator;
pub use simplify::Simplifier;
pub use types::{Answer, NOT_FOUND_ANSWER};
