use std::cell::Cell;

use groupn_domain::{Bid, Error, UtilityOracle, Value};

/// Each observed change of an issue value reduces its importance by this factor.
const CHANGE_DISCOUNT: f64 = 0.75;

/// Online model of a single counterpart. Infers which issues the counterpart
/// cares about from the way its bids change over time.
///
/// Heuristic: an issue that changed late and rarely was held firmly for longer,
/// so it is assumed to be more important. Issue that never changed gets weight 0
/// as soon as any other issue changed.
#[derive(Clone, Debug)]
pub struct OpponentModel {
    name: String,
    issue_count: usize,
    /// Values from the first observed bid. Never revised afterwards.
    assumed_values: Vec<Option<Value>>,
    change_count: Vec<u32>,
    /// 1-based position in the bid history of the first change. 0 means never changed.
    earliest_change_round: Vec<usize>,
    weights: Vec<f64>,
    bids: Vec<Bid>,
    /// Counts lookups in `update` and in `predicted_utility`, which takes `&self`.
    modeling_errors: Cell<usize>,
}

impl OpponentModel {
    pub fn new(name: &str, issue_count: usize) -> OpponentModel {
        OpponentModel {
            name: name.to_string(),
            issue_count,
            assumed_values: vec![None; issue_count],
            change_count: vec![0; issue_count],
            earliest_change_round: vec![0; issue_count],
            weights: uniform(issue_count),
            bids: vec![],
            modeling_errors: Cell::new(0),
        }
    }

    /// Adds next bid proposed by the counterpart and recomputes issue weights.
    pub fn update(&mut self, bid: Bid) {
        let round = self.bids.len() + 1;

        match self.bids.last() {
            None => {
                for (issue, assumed) in self.assumed_values.iter_mut().enumerate() {
                    match bid.value(issue) {
                        Ok(value) => *assumed = Some(value.clone()),
                        Err(e) => {
                            record_error(&self.modeling_errors, &self.name, &e, "Issue ignored.")
                        }
                    }
                }
            }
            Some(previous) => {
                for issue in 0..self.issue_count {
                    match (previous.value(issue), bid.value(issue)) {
                        (Ok(previous), Ok(current)) => {
                            if previous != current {
                                self.change_count[issue] += 1;
                                if self.earliest_change_round[issue] == 0 {
                                    self.earliest_change_round[issue] = round;
                                }
                            }
                        }
                        (Err(e), _) | (_, Err(e)) => {
                            record_error(&self.modeling_errors, &self.name, &e, "Issue ignored.")
                        }
                    }
                }
            }
        }

        self.bids.push(bid);
        self.recompute_weights();

        log::trace!(
            "Opponent model '{}' after {} bid(s): weights {:?}",
            self.name,
            self.bids.len(),
            self.weights
        );
    }

    fn recompute_weights(&mut self) {
        let raw = self
            .change_count
            .iter()
            .zip(self.earliest_change_round.iter())
            .map(|(changes, round)| CHANGE_DISCOUNT.powi(*changes as i32) * *round as f64)
            .collect::<Vec<_>>();

        let sum: f64 = raw.iter().sum();
        self.weights = if sum > 0.0 {
            raw.into_iter().map(|weight| weight / sum).collect()
        } else {
            // Nothing changed yet, so nothing distinguishes the issues.
            uniform(self.issue_count)
        };
    }

    /// Predicted counterpart utility: sum of weights of the issues on which `bid`
    /// agrees with the assumed values. Always 0 before the first update.
    pub fn predicted_utility(&self, bid: &Bid) -> f64 {
        if self.bids.is_empty() {
            return 0.0;
        }

        let mut utility = 0.0;
        for (issue, (weight, assumed)) in self
            .weights
            .iter()
            .zip(self.assumed_values.iter())
            .enumerate()
        {
            match bid.value(issue) {
                Ok(value) if assumed.as_ref() == Some(value) => utility += weight,
                Ok(_) => {}
                Err(e) => {
                    record_error(&self.modeling_errors, &self.name, &e, "No match assumed.")
                }
            }
        }
        utility
    }

    /// Bid made of the assumed values. Fails if some issue has no assumed value,
    /// in particular before the first update.
    pub fn assumed_bid(&self) -> Result<Bid, Error> {
        let values = self
            .assumed_values
            .iter()
            .enumerate()
            .map(|(issue, value)| value.clone().ok_or(Error::IllegalBidAccess { issue }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Bid::new(values))
    }

    /// Own utility of the bid the counterpart is assumed to want.
    pub fn mutual_value<O>(&self, oracle: &O) -> Result<f64, Error>
    where
        O: UtilityOracle + ?Sized,
    {
        oracle.utility(&self.assumed_bid()?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn change_counts(&self) -> &[u32] {
        &self.change_count
    }

    pub fn earliest_change_rounds(&self) -> &[usize] {
        &self.earliest_change_round
    }

    pub fn assumed_value(&self, issue: usize) -> Option<&Value> {
        self.assumed_values.get(issue).and_then(Option::as_ref)
    }

    /// Value the counterpart used for the issue in its most recent bid.
    pub fn latest_value(&self, issue: usize) -> Option<&Value> {
        self.bids.last().and_then(|bid| bid.value(issue).ok())
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    /// Number of bid lookups outside of the tracked issues, both while
    /// updating and while predicting.
    pub fn modeling_errors(&self) -> usize {
        self.modeling_errors.get()
    }
}

fn record_error(counter: &Cell<usize>, name: &str, e: &Error, consequence: &str) {
    counter.set(counter.get() + 1);
    log::warn!("Opponent model '{name}': {e} {consequence}");
}

fn uniform(issue_count: usize) -> Vec<f64> {
    if issue_count == 0 {
        return vec![];
    }
    vec![1.0 / issue_count as f64; issue_count]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::three_issue_space;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    const EPSILON: f64 = 1e-9;

    fn model_with(bids: &[&[&str]]) -> OpponentModel {
        let mut model = OpponentModel::new("opponent", 3);
        for bid in bids {
            model.update(Bid::from_values(bid.iter().copied()));
        }
        model
    }

    fn assert_weights(model: &OpponentModel, expected: &[f64]) {
        for (weight, expected) in model.weights().iter().zip(expected.iter()) {
            assert!(
                (weight - expected).abs() < EPSILON,
                "{:?} != {:?}",
                model.weights(),
                expected
            );
        }
    }

    #[test]
    fn test_late_and_rare_changes_weigh_more() {
        let model = model_with(&[&["X", "Y", "Z"], &["X", "Y", "W"], &["X", "V", "W"]]);

        assert_eq!(model.change_counts(), &[0, 1, 1]);
        assert_eq!(model.earliest_change_rounds(), &[0, 3, 2]);
        assert_weights(&model, &[0.0, 0.6, 0.4]);
    }

    #[test]
    fn test_repeated_changes_are_discounted() {
        let model = model_with(&[
            &["X", "Y", "Z"],
            &["A", "Y", "Z"],
            &["X", "Y", "Z"],
            &["X", "B", "Z"],
        ]);

        assert_eq!(model.change_counts(), &[2, 1, 0]);
        assert_eq!(model.earliest_change_rounds(), &[2, 4, 0]);
        // raw: [0.75^2 * 2, 0.75 * 4, 0] = [1.125, 3.0, 0]
        assert_weights(&model, &[1.125 / 4.125, 3.0 / 4.125, 0.0]);
    }

    #[test]
    fn test_assumed_values_come_from_first_bid() {
        let model = model_with(&[&["X", "Y", "Z"], &["A", "B", "C"]]);

        assert_eq!(model.assumed_value(0), Some(&Value::from("X")));
        assert_eq!(model.assumed_value(2), Some(&Value::from("Z")));
        assert_eq!(model.latest_value(0), Some(&Value::from("A")));
        assert_eq!(model.latest_value(3), None);
        assert_eq!(model.bids().len(), 2);
    }

    #[test]
    fn test_uniform_weights_until_first_change() {
        let empty = OpponentModel::new("opponent", 4);
        assert_weights(&empty, &[0.25; 4]);
        assert_eq!(empty.predicted_utility(&Bid::from_values(["X", "Y", "Z", "Q"])), 0.0);

        let model = model_with(&[&["X", "Y", "Z"], &["X", "Y", "Z"]]);
        assert_weights(&model, &[1.0 / 3.0; 3]);
        let prediction = model.predicted_utility(&Bid::from_values(["X", "Y", "Z"]));
        assert!((prediction - 1.0).abs() < EPSILON);
    }

    #[test_case(&["X", "Y", "Z"], 1.0; "first bid itself")]
    #[test_case(&["A", "Y", "C"], 0.6; "matches most important issue")]
    #[test_case(&["A", "B", "Z"], 0.4; "matches second issue")]
    #[test_case(&["X", "B", "C"], 0.0; "matches only zero weight issue")]
    #[test_case(&["X", "V", "W"], 0.0; "latest bid differs from first impression")]
    #[test_case(&["A", "B", "C"], 0.0; "matches nothing")]
    fn test_predicted_utility(bid: &[&str], expected: f64) {
        let model = model_with(&[&["X", "Y", "Z"], &["X", "Y", "W"], &["X", "V", "W"]]);
        let bid = Bid::from_values(bid.iter().copied());

        let first = model.predicted_utility(&bid);
        assert!((first - expected).abs() < EPSILON);
        assert_eq!(first, model.predicted_utility(&bid));
    }

    #[test]
    fn test_missing_issue_is_local_error() {
        let mut model = model_with(&[&["X", "Y", "Z"], &["X", "V", "W"]]);
        model.update(Bid::from_values(["X", "V"]));

        assert_eq!(model.modeling_errors(), 1);
        assert_eq!(model.bids().len(), 3);

        // Issue 2 missing in the queried bid contributes nothing, but is counted.
        let weights = model.weights().to_vec();
        let prediction = model.predicted_utility(&Bid::from_values(["X", "Y"]));
        assert!((prediction - (weights[0] + weights[1])).abs() < EPSILON);
        assert_eq!(model.modeling_errors(), 2);

        model.predicted_utility(&Bid::from_values(["X", "Y", "Z"]));
        assert_eq!(model.modeling_errors(), 2);
    }

    #[test]
    fn test_mutual_value() {
        let space = three_issue_space();

        let empty = OpponentModel::new("opponent", 3);
        assert!(matches!(
            empty.mutual_value(&space),
            Err(Error::IllegalBidAccess { issue: 0 })
        ));

        // Later bids don't change assumed values.
        let model = model_with(&[&["A", "V", "Z"], &["X", "Y", "Z"]]);
        assert_eq!(model.assumed_bid().unwrap(), Bid::from_values(["A", "V", "Z"]));
        assert!((model.mutual_value(&space).unwrap() - 0.65).abs() < EPSILON);
    }

    #[test]
    fn test_weights_always_sum_to_one() {
        let values = ["A", "B", "C"];
        let mut rng = StdRng::seed_from_u64(42);
        let mut model = OpponentModel::new("random", 5);

        for _ in 0..200 {
            let bid = Bid::from_values((0..5).map(|_| values[rng.gen_range(0..values.len())]));
            model.update(bid.clone());

            let sum: f64 = model.weights().iter().sum();
            assert!((sum - 1.0).abs() < EPSILON);

            let prediction = model.predicted_utility(&bid);
            assert!((0.0..=1.0 + EPSILON).contains(&prediction));

            if model.change_counts().iter().any(|changes| *changes > 0) {
                for (issue, round) in model.earliest_change_rounds().iter().enumerate() {
                    if *round == 0 {
                        assert_eq!(model.weights()[issue], 0.0);
                    }
                }
            }
        }
    }
}
