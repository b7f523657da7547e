use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use groupn_domain::{Bid, Error, UtilityOracle};

/// Controls how `CandidatePool` is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of random draws when bid space is too big to enumerate.
    pub capacity: usize,
    /// Bid spaces up to this size are enumerated exhaustively.
    pub exhaustive_threshold: u64,
    /// Seed of the sampler, so the same config always gives the same pool.
    pub seed: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            capacity: 100_000,
            exhaustive_threshold: 100_000,
            seed: 0,
        }
    }
}

/// Search space for bid selection. Built once at the beginning of negotiations
/// and never modified afterwards. Own optimal bid is always the first element.
#[derive(Clone, Debug)]
pub struct CandidatePool {
    bids: Vec<Bid>,
}

impl CandidatePool {
    /// Enumerates whole bid space if it is small enough, otherwise draws
    /// `capacity` bids uniformly at random (duplicates are dropped).
    pub fn build<O>(oracle: &O, config: &PoolConfig) -> Result<CandidatePool, Error>
    where
        O: UtilityOracle + ?Sized,
    {
        let optimal = oracle.optimal_bid()?;

        let mut unique = HashSet::new();
        unique.insert(optimal.clone());
        let mut bids = vec![optimal];

        let domain = oracle.domain();
        match domain.bid_space_size() {
            Some(size) if size <= config.exhaustive_threshold => {
                for bid in domain.bids() {
                    if unique.insert(bid.clone()) {
                        bids.push(bid);
                    }
                }
                log::debug!(
                    "Enumerated all {} bids of domain '{}'.",
                    bids.len(),
                    domain.name
                );
            }
            size => {
                let mut rng = StdRng::seed_from_u64(config.seed);
                for _ in 0..config.capacity {
                    let bid = oracle.random_bid(&mut rng)?;
                    if unique.insert(bid.clone()) {
                        bids.push(bid);
                    }
                }
                log::debug!(
                    "Sampled {} unique bids out of {} from domain '{}'.",
                    bids.len(),
                    size.map(|size| size.to_string())
                        .unwrap_or_else(|| "more than u64::MAX".to_string()),
                    domain.name
                );
            }
        }

        Ok(CandidatePool { bids })
    }

    pub fn optimal(&self) -> &Bid {
        // Pool is never empty, because constructor always inserts optimal bid.
        &self.bids[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bid> {
        self.bids.iter()
    }

    pub fn contains(&self, bid: &Bid) -> bool {
        self.bids.contains(bid)
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}
