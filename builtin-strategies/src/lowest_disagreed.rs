use groupn_domain::{Bid, Value};

use crate::OpponentModel;

/// Simple concession: give in on the least important own issue, on which some
/// opponent's latest bid disagrees with our current bid.
#[derive(Clone, Debug)]
pub struct LowestDisagreed {
    /// Own issues ordered from the most to the least important.
    issue_order: Vec<usize>,
}

impl LowestDisagreed {
    pub fn new(issue_order: Vec<usize>) -> LowestDisagreed {
        LowestDisagreed { issue_order }
    }

    /// Least important issue with disagreement together with the value that
    /// the first disagreeing opponent wants there.
    pub fn lowest_disagreement(
        &self,
        own: &Bid,
        opponents: &[&OpponentModel],
    ) -> Option<(usize, Value)> {
        for issue in self.issue_order.iter().rev().copied() {
            let ours = match own.value(issue) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Skipping issue {issue} while looking for disagreement: {e}");
                    continue;
                }
            };

            let theirs = opponents
                .iter()
                .filter_map(|model| model.latest_value(issue))
                .find(|theirs| *theirs != ours);

            if let Some(theirs) = theirs {
                return Some((issue, theirs.clone()));
            }
        }
        None
    }

    /// Own bid with the least important disagreement resolved in favor of the
    /// opponent. Returns unchanged bid if there is no disagreement at all.
    pub fn concede(&self, own: &Bid, opponents: &[&OpponentModel]) -> Bid {
        let mut bid = own.clone();
        match self.lowest_disagreement(own, opponents) {
            Some((issue, value)) => {
                log::debug!("Conceding on issue {issue}: taking opponent's value '{value}'.");
                if let Err(e) = bid.set_value(issue, value) {
                    log::warn!("Failed to concede on issue {issue}: {e}");
                }
            }
            None => log::debug!("Couldn't find a disagreed value."),
        }
        bid
    }
}
