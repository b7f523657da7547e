use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Bid, Error, Value};

/// Single negotiable dimension with discrete set of possible values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub name: String,
    pub values: Vec<Value>,
}

/// Set of issues negotiated in a session. Order of issues defines issue indices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub issues: Vec<Issue>,
}

impl Issue {
    pub fn new<V: Into<Value>>(name: &str, values: impl IntoIterator<Item = V>) -> Issue {
        Issue {
            name: name.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Domain {
    pub fn new(name: &str, issues: Vec<Issue>) -> Domain {
        Domain {
            name: name.to_string(),
            issues,
        }
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Number of distinct bids in this domain or `None` if it doesn't fit in `u64`.
    pub fn bid_space_size(&self) -> Option<u64> {
        self.issues
            .iter()
            .try_fold(1u64, |acc, issue| acc.checked_mul(issue.values.len() as u64))
    }

    /// Decodes bid from its position in the bid space. The last issue changes fastest.
    /// Returns `None` for indices outside of the bid space.
    pub fn bid_at(&self, mut index: u64) -> Option<Bid> {
        if index >= self.bid_space_size()? {
            return None;
        }

        let mut values = vec![Value::new(""); self.issues.len()];
        for (slot, issue) in values.iter_mut().zip(self.issues.iter()).rev() {
            let radix = issue.values.len() as u64;
            *slot = issue.values[(index % radix) as usize].clone();
            index /= radix;
        }
        Some(Bid::new(values))
    }

    /// Enumerates whole bid space. Empty if any issue has no values or space
    /// size overflows.
    pub fn bids(&self) -> impl Iterator<Item = Bid> + '_ {
        let size = self.bid_space_size().unwrap_or(0);
        (0..size).filter_map(move |index| self.bid_at(index))
    }

    /// Draws every issue value uniformly and independently.
    pub fn random_bid<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Bid, Error> {
        self.issues
            .iter()
            .map(|issue| {
                issue.values.choose(&mut *rng).cloned().ok_or_else(|| {
                    Error::IllegalBid(format!("Issue '{}' has no values.", issue.name))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Bid::new)
    }

    /// Checks if bid assigns a legal value to every issue and nothing more.
    pub fn validate_bid(&self, bid: &Bid) -> Result<(), Error> {
        if bid.issue_count() != self.issue_count() {
            return Err(Error::IllegalBid(format!(
                "Bid {} has {} values, but domain '{}' has {} issues.",
                bid,
                bid.issue_count(),
                self.name,
                self.issue_count()
            )));
        }

        for (idx, issue) in self.issues.iter().enumerate() {
            let value = bid.value(idx)?;
            if !issue.values.contains(value) {
                return Err(Error::IllegalBid(format!(
                    "Value '{}' isn't allowed for issue '{}'.",
                    value, issue.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn party_domain() -> Domain {
        Domain::new(
            "party",
            vec![
                Issue::new("Food", ["Chips", "Catering"]),
                Issue::new("Drinks", ["Beer", "Wine", "Water"]),
                Issue::new("Music", ["Band", "DJ"]),
            ],
        )
    }

    #[test]
    fn test_enumerate_whole_bid_space() {
        let domain = party_domain();
        assert_eq!(domain.bid_space_size(), Some(12));

        let bids = domain.bids().collect::<Vec<_>>();
        assert_eq!(bids.len(), 12);
        assert_eq!(bids[0], Bid::from_values(["Chips", "Beer", "Band"]));
        assert_eq!(bids[1], Bid::from_values(["Chips", "Beer", "DJ"]));
        assert_eq!(bids[11], Bid::from_values(["Catering", "Water", "DJ"]));

        let unique = bids.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), 12);
        assert!(domain.bid_at(12).is_none());
    }

    #[test]
    fn test_random_bid_is_legal() {
        let domain = party_domain();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let bid = domain.random_bid(&mut rng).unwrap();
            domain.validate_bid(&bid).unwrap();
        }
    }

    #[test]
    fn test_validate_bid() {
        let domain = party_domain();

        assert!(domain
            .validate_bid(&Bid::from_values(["Chips", "Wine"]))
            .is_err());
        assert!(domain
            .validate_bid(&Bid::from_values(["Chips", "Milk", "DJ"]))
            .is_err());
    }

    #[test]
    fn test_empty_issue() {
        let domain = Domain::new(
            "empty",
            vec![Issue {
                name: "Nothing".to_string(),
                values: vec![],
            }],
        );
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(domain.bid_space_size(), Some(0));
        assert_eq!(domain.bids().count(), 0);
        assert!(domain.random_bid(&mut rng).is_err());
    }
}
