use groupn_domain::{AdditiveUtilitySpace, Bid, Domain, Issue, Value};
use std::collections::HashMap;

use crate::OpponentModel;

fn evaluation(values: &[(&str, f64)]) -> HashMap<Value, f64> {
    values
        .iter()
        .map(|(value, eval)| (Value::from(*value), *eval))
        .collect()
}

/// Three issues weighted [0.5, 0.3, 0.2]. Own optimal bid is (A, B, C) with utility 1.
pub fn three_issue_space() -> AdditiveUtilitySpace {
    let domain = Domain::new(
        "three-issues",
        vec![
            Issue::new("first", ["A", "X"]),
            Issue::new("second", ["B", "V", "Y"]),
            Issue::new("third", ["C", "W", "Z"]),
        ],
    );
    AdditiveUtilitySpace::new(
        domain,
        vec![0.5, 0.3, 0.2],
        vec![
            evaluation(&[("A", 1.0), ("X", 0.0)]),
            evaluation(&[("B", 1.0), ("V", 0.5), ("Y", 0.0)]),
            evaluation(&[("C", 1.0), ("W", 0.5), ("Z", 0.0)]),
        ],
        0.1,
        1.0,
    )
    .unwrap()
}

pub fn opponent(name: &str, bids: &[[&str; 3]]) -> OpponentModel {
    let mut model = OpponentModel::new(name, 3);
    for bid in bids {
        model.update(Bid::from_values(*bid));
    }
    model
}
