//! Utility spaces and parties shared by tests.
use std::sync::Arc;

use groupn_domain::AdditiveUtilitySpace;
use groupn_negotiator::factory::{LoadMode, PartyConfig};
use groupn_party_component::{
    Action, ActionKind, Bid, NegotiationParty, PartyContext, PartyId, Sender, Timeline,
};

const THREE_ISSUES: &str = r#"
domain:
  name: three-issues
  issues:
    - name: first
      values: [A, X]
    - name: second
      values: [B, V, Y]
    - name: third
      values: [C, W, Z]
weights: [0.5, 0.3, 0.2]
evaluations:
  - { A: 1.0, X: 0.0 }
  - { B: 1.0, V: 0.5, Y: 0.0 }
  - { C: 1.0, W: 0.5, Z: 0.0 }
reservation_value: 0.1
"#;

const OPPOSING: &str = r#"
domain:
  name: three-issues
  issues:
    - name: first
      values: [A, X]
    - name: second
      values: [B, V, Y]
    - name: third
      values: [C, W, Z]
weights: [0.2, 0.3, 0.5]
evaluations:
  - { A: 0.0, X: 1.0 }
  - { B: 0.0, V: 0.5, Y: 1.0 }
  - { C: 0.0, W: 0.5, Z: 1.0 }
reservation_value: 0.1
"#;

const MEDIATOR: &str = r#"
domain:
  name: three-issues
  issues:
    - name: first
      values: [A, X]
    - name: second
      values: [B, V, Y]
    - name: third
      values: [C, W, Z]
weights: [0.4, 0.4, 0.2]
evaluations:
  - { A: 0.6, X: 0.6 }
  - { B: 0.3, V: 1.0, Y: 0.3 }
  - { C: 0.5, W: 1.0, Z: 0.5 }
reservation_value: 0.2
discount_factor: 0.8
"#;

/// Prefers (A, B, C), issues weighted [0.5, 0.3, 0.2].
pub fn three_issue_space() -> AdditiveUtilitySpace {
    AdditiveUtilitySpace::from_yaml(THREE_ISSUES).expect("three issue fixture")
}

/// Same domain as `three_issue_space` with exactly opposite preferences.
pub fn opposing_space() -> AdditiveUtilitySpace {
    AdditiveUtilitySpace::from_yaml(OPPOSING).expect("opposing fixture")
}

/// Likes the middle values and doesn't care about the first issue.
pub fn mediator_space() -> AdditiveUtilitySpace {
    AdditiveUtilitySpace::from_yaml(MEDIATOR).expect("mediator fixture")
}

pub fn context(name: &str, space: AdditiveUtilitySpace) -> PartyContext {
    PartyContext::new(PartyId::new(name), Arc::new(space))
}

pub fn groupn_config() -> PartyConfig {
    PartyConfig {
        name: "Groupn".to_string(),
        load_mode: LoadMode::BuiltIn,
        params: serde_yaml::Value::Null,
    }
}

/// Repeats its optimal bid and never accepts anything.
pub struct Stubborn {
    id: PartyId,
    bid: Bid,
}

impl Stubborn {
    pub fn create(ctx: PartyContext) -> anyhow::Result<Box<dyn NegotiationParty>> {
        Ok(Box::new(Stubborn {
            bid: ctx.oracle.optimal_bid()?,
            id: ctx.id,
        }))
    }
}

impl NegotiationParty for Stubborn {
    fn id(&self) -> &PartyId {
        &self.id
    }

    fn choose_action(&mut self, _: &[ActionKind], _: &Timeline) -> anyhow::Result<Action> {
        Ok(Action::Offer(self.bid.clone()))
    }

    fn receive_message(&mut self, _: &Sender, _: &Action) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fails as soon as it is asked to act.
pub struct Broken {
    id: PartyId,
}

impl Broken {
    pub fn create(ctx: PartyContext) -> anyhow::Result<Box<dyn NegotiationParty>> {
        Ok(Box::new(Broken { id: ctx.id }))
    }
}

impl NegotiationParty for Broken {
    fn id(&self) -> &PartyId {
        &self.id
    }

    fn choose_action(&mut self, _: &[ActionKind], _: &Timeline) -> anyhow::Result<Action> {
        anyhow::bail!("Party '{}' is broken.", self.id)
    }

    fn receive_message(&mut self, _: &Sender, _: &Action) -> anyhow::Result<()> {
        Ok(())
    }
}
