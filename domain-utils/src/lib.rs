pub mod bid;
pub mod domain;
mod error;
pub mod utility;

pub use bid::{Bid, Value};
pub use domain::{Domain, Issue};
pub use error::Error;
pub use utility::{rank_issues, AdditiveUtilitySpace, UtilityOracle};
