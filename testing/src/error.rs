use std::time::Duration;

use groupn_party_component::PartyId;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Session needs at least 2 parties, got {0}.")]
    NotEnoughParties(usize),
    #[error("Party {0} not found.")]
    PartyNotFound(String),
    #[error("Party {party} didn't finish its turn within {timeout:?}.")]
    TurnTimeout { party: PartyId, timeout: Duration },
}
