use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use groupn_party_component::{Action, Bid, PartyId};

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Agreement,
    Deadline,
    /// Some party failed its turn.
    Failure,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    pub turn: usize,
    pub party: PartyId,
    /// Fraction of negotiation time in range [0, 1].
    pub elapsed: f64,
    pub action: Action,
}

/// Everything that happened during a single session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationRecord {
    pub parties: Vec<PartyId>,
    pub turns: Vec<Turn>,
    pub errors: BTreeMap<PartyId, Vec<String>>,
    pub agreement: Option<Bid>,
    pub outcome: Option<Outcome>,
    pub rounds: usize,
}

impl NegotiationRecord {
    pub fn new(parties: Vec<PartyId>) -> NegotiationRecord {
        NegotiationRecord {
            parties,
            turns: vec![],
            errors: BTreeMap::new(),
            agreement: None,
            outcome: None,
            rounds: 0,
        }
    }

    pub fn action(&mut self, party: &PartyId, elapsed: f64, action: Action) {
        self.turns.push(Turn {
            turn: self.turns.len(),
            party: party.clone(),
            elapsed,
            action,
        });
    }

    pub fn error(&mut self, party: &PartyId, e: anyhow::Error) {
        self.errors
            .entry(party.clone())
            .or_default()
            .push(e.to_string())
    }

    pub fn finish(&mut self, outcome: Outcome, agreement: Option<Bid>) {
        let parties = self.parties.len().max(1);
        self.rounds = (self.turns.len() + parties - 1) / parties;
        self.outcome = Some(outcome);
        self.agreement = agreement;
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Bids offered by the party in order.
    pub fn offers_of(&self, party: &PartyId) -> Vec<&Bid> {
        self.turns
            .iter()
            .filter(|turn| &turn.party == party)
            .filter_map(|turn| turn.action.bid())
            .collect()
    }
}

impl fmt::Display for NegotiationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}
