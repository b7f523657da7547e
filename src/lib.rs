mod actor;
pub mod agent;
pub mod factory;

pub use actor::{ChooseAction, NegotiationEnded, PartyActor, PartyAddr, ReceiveMessage};
pub use agent::{AgentConfig, AgentError, BidStrategy, DecisionState, NegotiationAgent};

pub use groupn_party_component::{
    Action, ActionKind, NegotiationParty, PartyContext, PartyId, Sender, Timeline,
};

pub mod domain {
    pub use groupn_domain::*;
}

pub mod strategies {
    pub use groupn_strategies::*;
}

pub mod component {
    pub use groupn_party_component::static_lib::{create_static_party, register_party};
    pub use groupn_party_component::{factory, PartyFactory};
}

use groupn_party_component::{factory, register_party};

/// Makes built-in parties available through `LoadMode::StaticLib`.
pub fn register_parties() {
    register_party("groupn", "Groupn", factory::<NegotiationAgent>());
}
