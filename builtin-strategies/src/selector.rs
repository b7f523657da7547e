use serde::{Deserialize, Serialize};

use groupn_domain::{Bid, UtilityOracle};

use crate::{CandidatePool, OpponentModel};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("No candidate bid reaches target utility {target}.")]
    EmptyCandidateSet { target: f64 },
}

/// Chooses the candidate, that opponents are predicted to like the most on
/// average, penalized by how unevenly that appeal is spread between them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BidSelector {
    /// Scale of the standard deviation penalty.
    pub deviation_importance: f64,
}

impl Default for BidSelector {
    fn default() -> Self {
        BidSelector {
            deviation_importance: 1.0,
        }
    }
}

impl BidSelector {
    pub fn new(deviation_importance: f64) -> BidSelector {
        BidSelector {
            deviation_importance,
        }
    }

    /// Rating of a candidate from its own utility and predicted utilities of
    /// all opponents. Without opponents the rating is own utility.
    ///
    /// Note: deviation penalty is divided by number of opponents, so it fades
    /// away when many opponents negotiate.
    pub fn rate(&self, own_utility: f64, predictions: &[f64]) -> f64 {
        if predictions.is_empty() {
            return own_utility;
        }

        let count = predictions.len() as f64;
        let average = predictions.iter().sum::<f64>() / count;
        let variance = predictions
            .iter()
            .map(|utility| (utility - average) * (utility - average))
            .sum::<f64>()
            / count;

        average - self.deviation_importance * variance.sqrt() / count
    }

    /// Returns the best rated bid from `pool`, that gives at least `target` own utility.
    /// From equally rated bids the first one in pool order wins.
    pub fn select<'p, O>(
        &self,
        pool: &'p CandidatePool,
        oracle: &O,
        target: f64,
        opponents: &[&OpponentModel],
    ) -> Result<&'p Bid, SelectionError>
    where
        O: UtilityOracle + ?Sized,
    {
        let mut best = None;
        let mut score = f64::NEG_INFINITY;
        let mut predictions = Vec::with_capacity(opponents.len());

        for bid in pool.iter() {
            let utility = match oracle.utility(bid) {
                Ok(utility) => utility,
                Err(e) => {
                    log::warn!("Can't compute utility of candidate {bid}: {e}");
                    0.0
                }
            };

            if utility < target {
                continue;
            }

            predictions.clear();
            predictions.extend(opponents.iter().map(|model| model.predicted_utility(bid)));

            let rating = self.rate(utility, &predictions);
            if rating > score {
                score = rating;
                best = Some(bid);
            }
        }

        match best {
            Some(bid) => {
                log::trace!("Selected bid {bid} rated {score} for target {target}.");
                Ok(bid)
            }
            None => Err(SelectionError::EmptyCandidateSet { target }),
        }
    }
}
