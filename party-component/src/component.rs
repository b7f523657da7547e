use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use groupn_domain::{Bid, UtilityOracle};

/// Kinds of actions, that protocol can allow party to take in its turn.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Accept,
    Offer,
}

/// Action taken by a party in its turn.
#[derive(Clone, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Accept the last offer on the table.
    #[display(fmt = "Accept")]
    Accept,
    /// Propose new bid to all other parties.
    #[display(fmt = "Offer{}", _0)]
    Offer(Bid),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Accept => ActionKind::Accept,
            Action::Offer(_) => ActionKind::Offer,
        }
    }

    pub fn bid(&self) -> Option<&Bid> {
        match self {
            Action::Accept => None,
            Action::Offer(bid) => Some(bid),
        }
    }
}

/// Identity of a negotiating party. Assigned by whoever constructs the party.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl ToString) -> PartyId {
        PartyId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Origin of a message delivered to a party.
#[derive(Clone, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// Administrative messages from the protocol itself.
    #[display(fmt = "Protocol")]
    Protocol,
    #[display(fmt = "{}", _0)]
    Party(PartyId),
}

/// Negotiation clock as seen by the party in its turn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub elapsed: f64,
    pub total: f64,
}

impl Timeline {
    pub fn new(elapsed: f64, total: f64) -> Timeline {
        Timeline { elapsed, total }
    }

    /// Elapsed part of the negotiation in range [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total <= 0.0 || self.elapsed.is_nan() {
            return 1.0;
        }
        (self.elapsed / self.total).clamp(0.0, 1.0)
    }
}

/// Everything the protocol runtime hands to a party at construction time.
#[derive(Clone)]
pub struct PartyContext {
    pub id: PartyId,
    pub oracle: Arc<dyn UtilityOracle + Send + Sync>,
}

impl PartyContext {
    pub fn new(id: PartyId, oracle: Arc<dyn UtilityOracle + Send + Sync>) -> PartyContext {
        PartyContext { id, oracle }
    }
}

/// `NegotiationParty` implements decision logic of single participant of
/// multi-issue, multi-round negotiations. Protocol runtime calls it in strict
/// round order, so implementations don't need any synchronization.
pub trait NegotiationParty {
    fn id(&self) -> &PartyId;

    /// Called in party's turn. Implementation must return one of `legal_actions`.
    /// Returned error means that party failed its turn, protocol decides what happens next.
    fn choose_action(
        &mut self,
        legal_actions: &[ActionKind],
        timeline: &Timeline,
    ) -> anyhow::Result<Action>;

    /// Called for every action taken by other parties and for administrative
    /// messages from the protocol.
    fn receive_message(&mut self, sender: &Sender, action: &Action) -> anyhow::Result<()>;

    /// Notification about the end of negotiations. `agreement` is `None`, if
    /// deadline passed without agreement.
    fn negotiation_ended(&mut self, _agreement: Option<&Bid>) -> anyhow::Result<()> {
        Ok(())
    }
}
