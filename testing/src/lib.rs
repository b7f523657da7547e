pub mod error;
pub mod fixtures;
mod framework;
mod negotiation_record;

pub use framework::{Deadline, Framework, FrameworkError, Participant, SessionConfig};
pub use negotiation_record::{NegotiationRecord, Outcome, Turn};
