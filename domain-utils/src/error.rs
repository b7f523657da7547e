#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bid has no value for issue {issue}.")]
    IllegalBidAccess { issue: usize },
    #[error("Illegal bid. {0}")]
    IllegalBid(String),
    #[error("No optimal bid exists. {0}")]
    NoOptimalBid(String),
    #[error("Invalid utility space. {0}")]
    InvalidSpace(String),
    #[error("Can't parse utility space. {0}")]
    Yaml(#[from] serde_yaml::Error),
}
