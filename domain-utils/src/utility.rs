use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{Bid, Domain, Error, Value};

const WEIGHTS_TOLERANCE: f64 = 1e-6;

/// Own preferences of a negotiating party. Negotiation logic treats it as a pure
/// function from `Bid` to utility, it never looks inside.
pub trait UtilityOracle {
    fn domain(&self) -> &Domain;

    /// Own utility of a bid in range [0, 1]. Fails with `IllegalBid` for malformed bids.
    fn utility(&self, bid: &Bid) -> Result<f64, Error>;

    /// Bid with maximal own utility. Fails with `NoOptimalBid` if domain is infeasible.
    fn optimal_bid(&self) -> Result<Bid, Error>;

    fn reservation_value(&self) -> f64;

    fn discount_factor(&self) -> f64;

    /// Own importance of the issue. Weights of all issues sum up to 1.
    fn weight(&self, issue: usize) -> Result<f64, Error>;

    fn issue_count(&self) -> usize {
        self.domain().issue_count()
    }

    fn random_bid(&self, rng: &mut dyn RngCore) -> Result<Bid, Error> {
        self.domain().random_bid(rng)
    }
}

/// Orders issue indices by descending weight. Issues with equal weights keep
/// their original relative order.
pub fn rank_issues(weights: &[f64]) -> Vec<usize> {
    let mut order = (0..weights.len()).collect::<Vec<_>>();
    order.sort_by(|left, right| {
        weights[*right]
            .partial_cmp(&weights[*left])
            .unwrap_or(Ordering::Equal)
    });
    order
}

fn default_discount() -> f64 {
    1.0
}

/// Linear additive utility: weighted sum of per issue value evaluations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdditiveUtilitySpace {
    pub domain: Domain,
    pub weights: Vec<f64>,
    /// Evaluation of each value, separately for every issue. Values are expected
    /// to be in range [0, 1].
    pub evaluations: Vec<HashMap<Value, f64>>,
    #[serde(default)]
    pub reservation_value: f64,
    #[serde(default = "default_discount")]
    pub discount_factor: f64,
}

impl AdditiveUtilitySpace {
    pub fn new(
        domain: Domain,
        weights: Vec<f64>,
        evaluations: Vec<HashMap<Value, f64>>,
        reservation_value: f64,
        discount_factor: f64,
    ) -> Result<AdditiveUtilitySpace, Error> {
        let space = AdditiveUtilitySpace {
            domain,
            weights,
            evaluations,
            reservation_value,
            discount_factor,
        };
        space.validate()?;
        Ok(space)
    }

    pub fn from_yaml(content: &str) -> Result<AdditiveUtilitySpace, Error> {
        let space: AdditiveUtilitySpace = serde_yaml::from_str(content)?;
        space.validate()?;
        Ok(space)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let issues = self.domain.issue_count();
        if self.weights.len() != issues || self.evaluations.len() != issues {
            return Err(Error::InvalidSpace(format!(
                "Domain '{}' has {} issues, but got {} weights and {} evaluations.",
                self.domain.name,
                issues,
                self.weights.len(),
                self.evaluations.len()
            )));
        }

        if self.weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(Error::InvalidSpace(format!(
                "Weights {:?} must be in range [0, 1].",
                self.weights
            )));
        }

        let sum: f64 = self.weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHTS_TOLERANCE {
            return Err(Error::InvalidSpace(format!(
                "Weights sum up to {sum} instead of 1."
            )));
        }

        if !(0.0..=1.0).contains(&self.reservation_value) {
            return Err(Error::InvalidSpace(format!(
                "Reservation value {} outside of range [0, 1].",
                self.reservation_value
            )));
        }

        if !self.discount_factor.is_finite() || self.discount_factor < 0.0 {
            return Err(Error::InvalidSpace(format!(
                "Discount factor {} must be non negative.",
                self.discount_factor
            )));
        }

        for (issue, evaluation) in self.domain.issues.iter().zip(self.evaluations.iter()) {
            for value in issue.values.iter() {
                match evaluation.get(value) {
                    Some(eval) if (0.0..=1.0).contains(eval) => {}
                    Some(eval) => {
                        return Err(Error::InvalidSpace(format!(
                            "Evaluation {eval} of value '{value}' (issue '{}') outside of range [0, 1].",
                            issue.name
                        )))
                    }
                    None => {
                        return Err(Error::InvalidSpace(format!(
                            "Value '{value}' of issue '{}' has no evaluation.",
                            issue.name
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

impl UtilityOracle for AdditiveUtilitySpace {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn utility(&self, bid: &Bid) -> Result<f64, Error> {
        self.domain.validate_bid(bid)?;

        let mut utility = 0.0;
        for (idx, (weight, evaluation)) in self
            .weights
            .iter()
            .zip(self.evaluations.iter())
            .enumerate()
        {
            let value = bid.value(idx)?;
            let eval = evaluation.get(value).ok_or_else(|| {
                Error::IllegalBid(format!("No evaluation for value '{value}' of issue {idx}."))
            })?;
            utility += weight * eval;
        }
        Ok(utility)
    }

    fn optimal_bid(&self) -> Result<Bid, Error> {
        let mut values = Vec::with_capacity(self.domain.issue_count());
        for (issue, evaluation) in self.domain.issues.iter().zip(self.evaluations.iter()) {
            let mut best: Option<(&Value, f64)> = None;
            for value in issue.values.iter() {
                let eval = evaluation.get(value).copied().unwrap_or(0.0);
                // Strict comparison keeps the first of equally good values.
                if best.map(|(_, best_eval)| eval > best_eval).unwrap_or(true) {
                    best = Some((value, eval));
                }
            }

            let (value, _) = best.ok_or_else(|| {
                Error::NoOptimalBid(format!("Issue '{}' has no values.", issue.name))
            })?;
            values.push(value.clone());
        }
        Ok(Bid::new(values))
    }

    fn reservation_value(&self) -> f64 {
        self.reservation_value
    }

    fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    fn weight(&self, issue: usize) -> Result<f64, Error> {
        self.weights
            .get(issue)
            .copied()
            .ok_or(Error::IllegalBidAccess { issue })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const PARTY_SPACE: &str = r#"
domain:
  name: party
  issues:
    - name: Food
      values: [Chips, Catering]
    - name: Drinks
      values: [Beer, Wine]
    - name: Music
      values: [Band, DJ]
weights: [0.5, 0.3, 0.2]
evaluations:
  - { Chips: 0.4, Catering: 1.0 }
  - { Beer: 1.0, Wine: 0.5 }
  - { Band: 0.0, DJ: 1.0 }
reservation_value: 0.1
"#;

    #[test_case(&[0.5, 0.3, 0.2], &[0, 1, 2]; "already sorted")]
    #[test_case(&[0.2, 0.3, 0.5], &[2, 1, 0]; "reversed")]
    #[test_case(&[0.25, 0.5, 0.25], &[1, 0, 2]; "ties keep index order")]
    #[test_case(&[0.25, 0.25, 0.25, 0.25], &[0, 1, 2, 3]; "all equal")]
    #[test_case(&[], &[]; "no issues")]
    fn test_rank_issues(weights: &[f64], expected: &[usize]) {
        assert_eq!(rank_issues(weights), expected.to_vec());
    }

    #[test]
    fn test_load_space_from_yaml() {
        let space = AdditiveUtilitySpace::from_yaml(PARTY_SPACE).unwrap();

        assert_eq!(space.issue_count(), 3);
        assert_eq!(space.reservation_value(), 0.1);
        assert_eq!(space.discount_factor(), 1.0);
        assert_eq!(space.weight(2).unwrap(), 0.2);
        assert!(space.weight(3).is_err());
    }

    #[test]
    fn test_optimal_bid_has_maximal_utility() {
        let space = AdditiveUtilitySpace::from_yaml(PARTY_SPACE).unwrap();
        let optimal = space.optimal_bid().unwrap();

        assert_eq!(optimal, Bid::from_values(["Catering", "Beer", "DJ"]));
        assert!((space.utility(&optimal).unwrap() - 1.0).abs() < 1e-9);

        for bid in space.domain().bids() {
            assert!(space.utility(&bid).unwrap() <= space.utility(&optimal).unwrap());
        }
    }

    #[test]
    fn test_utility_of_bid() {
        let space = AdditiveUtilitySpace::from_yaml(PARTY_SPACE).unwrap();
        let bid = Bid::from_values(["Chips", "Wine", "Band"]);

        // 0.5 * 0.4 + 0.3 * 0.5 + 0.2 * 0.0
        assert!((space.utility(&bid).unwrap() - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_illegal_bid_utility() {
        let space = AdditiveUtilitySpace::from_yaml(PARTY_SPACE).unwrap();

        assert!(matches!(
            space.utility(&Bid::from_values(["Chips", "Wine"])),
            Err(Error::IllegalBid(_))
        ));
        assert!(matches!(
            space.utility(&Bid::from_values(["Chips", "Milk", "DJ"])),
            Err(Error::IllegalBid(_))
        ));
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let content = PARTY_SPACE.replace("[0.5, 0.3, 0.2]", "[0.5, 0.3, 0.3]");
        assert!(matches!(
            AdditiveUtilitySpace::from_yaml(&content),
            Err(Error::InvalidSpace(_))
        ));
    }

    #[test]
    fn test_missing_evaluation_rejected() {
        let content = PARTY_SPACE.replace("{ Band: 0.0, DJ: 1.0 }", "{ Band: 0.0 }");
        assert!(matches!(
            AdditiveUtilitySpace::from_yaml(&content),
            Err(Error::InvalidSpace(_))
        ));
    }
}
