pub mod component;
pub mod static_lib;

pub use component::{
    Action, ActionKind, NegotiationParty, PartyContext, PartyId, Sender, Timeline,
};
pub use static_lib::{create_static_party, factory, register_party, PartyFactory};

pub use groupn_domain::{Bid, UtilityOracle, Value};
