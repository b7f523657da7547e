pub mod candidates;
pub mod concession;
pub mod lowest_disagreed;
pub mod opponent;
pub mod selector;

pub use candidates::{CandidatePool, PoolConfig};
pub use concession::ConcessionPolicy;
pub use lowest_disagreed::LowestDisagreed;
pub use opponent::OpponentModel;
pub use selector::{BidSelector, SelectionError};

#[cfg(test)]
pub(crate) mod fixtures;
