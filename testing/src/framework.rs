use anyhow::anyhow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};

use groupn_domain::{AdditiveUtilitySpace, Bid, UtilityOracle};
use groupn_negotiator::factory::{create_party, PartyConfig};
use groupn_negotiator::PartyAddr;
use groupn_party_component::{
    Action, ActionKind, NegotiationParty, PartyContext, PartyId, Sender, Timeline,
};

use crate::error::SessionError;
use crate::negotiation_record::{NegotiationRecord, Outcome};

/// When the session ends, if parties didn't agree earlier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Deadline {
    /// Each party gets this many turns.
    Rounds(u32),
    Time(#[serde(with = "humantime_serde")] Duration),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub deadline: Deadline,
    #[serde(with = "humantime_serde")]
    pub turn_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            deadline: Deadline::Rounds(60),
            turn_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(thiserror::Error)]
#[error("{error}\nNegotiation traceback:\n\n{negotiation_traceback}")]
pub struct FrameworkError {
    error: anyhow::Error,
    negotiation_traceback: NegotiationRecord,
}

#[derive(Clone)]
pub struct Participant {
    pub id: PartyId,
    pub addr: PartyAddr,
    pub oracle: Arc<dyn UtilityOracle + Send + Sync>,
}

/// Runs stacked alternating offers protocol between parties:
/// - Parties take turns in the order they were added.
/// - The first party starts with an offer.
/// - Every action is broadcast to all other parties.
/// - Agreement is reached, when all other parties accept the last offer one after another.
pub struct Framework {
    pub parties: Vec<Participant>,
    pub config: SessionConfig,
}

impl Framework {
    pub fn new(config: SessionConfig) -> Framework {
        let _ = env_logger::builder().try_init();

        Framework {
            parties: vec![],
            config,
        }
    }

    pub fn new_empty() -> Framework {
        Self::new(SessionConfig::default())
    }

    pub fn deadline(mut self, deadline: Deadline) -> Self {
        self.config.deadline = deadline;
        self
    }

    pub fn turn_timeout(mut self, timeout: Duration) -> Self {
        self.config.turn_timeout = timeout;
        self
    }

    /// Creates party from config. Party gets `name` as its identity, or `name#n`
    /// if the name was already taken.
    pub fn add_party(
        self,
        name: &str,
        config: PartyConfig,
        space: AdditiveUtilitySpace,
    ) -> anyhow::Result<Self> {
        self.add_party_with(name, Arc::new(space), |ctx| create_party(config, ctx))
    }

    pub fn add_party_with<F>(
        mut self,
        name: &str,
        oracle: Arc<dyn UtilityOracle + Send + Sync>,
        create: F,
    ) -> anyhow::Result<Self>
    where
        F: FnOnce(PartyContext) -> anyhow::Result<Box<dyn NegotiationParty>>,
    {
        let id = PartyId::new(self.unique_name(name)?);
        let party = create(PartyContext::new(id.clone(), oracle.clone()))?;

        log::info!("Party '{id}' joined negotiations.");

        self.parties.push(Participant {
            addr: PartyAddr::from(party),
            id,
            oracle,
        });
        Ok(self)
    }

    fn unique_name(&self, name: &str) -> anyhow::Result<String> {
        let re = Regex::new(r"#(?P<idx>[0-9]+)\z")?;
        let mut name = name.to_string();

        while self.parties.iter().any(|party| party.id.as_str() == name) {
            if let Some(idx) = re
                .captures(&name)
                .and_then(|caps| caps.name("idx"))
                .and_then(|capture| capture.as_str().parse::<u32>().map(|idx| idx + 1).ok())
            {
                name = re.replace(&name, format!("#{idx}")).to_string()
            } else {
                name = format!("{name}#1");
            }
        }
        Ok(name)
    }

    pub fn party(&self, name: &str) -> anyhow::Result<&Participant> {
        self.parties
            .iter()
            .find(|party| party.id.as_str() == name)
            .ok_or_else(|| anyhow!(SessionError::PartyNotFound(name.to_string())))
    }

    /// Own utility of the bid according to the party's preferences.
    pub fn utility(&self, name: &str, bid: &Bid) -> anyhow::Result<f64> {
        Ok(self.party(name)?.oracle.utility(bid)?)
    }

    pub async fn run(&self) -> Result<NegotiationRecord, FrameworkError> {
        let mut record = NegotiationRecord::new(self.parties.iter().map(|p| p.id.clone()).collect());

        let count = self.parties.len();
        if count < 2 {
            return Err(FrameworkError::from(
                SessionError::NotEnoughParties(count),
                &record,
            ));
        }

        let start = Instant::now();
        let mut standing: Option<Bid> = None;
        let mut accepts = 0;
        let mut turn = 0;

        let outcome = loop {
            let timeline = match self.config.deadline {
                Deadline::Rounds(rounds) => {
                    let total = rounds as usize * count;
                    if turn >= total {
                        break Outcome::Deadline;
                    }
                    Timeline::new(turn as f64, total as f64)
                }
                Deadline::Time(limit) => {
                    let elapsed = start.elapsed();
                    if elapsed >= limit {
                        break Outcome::Deadline;
                    }
                    Timeline::new(elapsed.as_secs_f64(), limit.as_secs_f64())
                }
            };

            let party = &self.parties[turn % count];
            let legal_actions = match standing {
                None => vec![ActionKind::Offer],
                Some(_) => vec![ActionKind::Accept, ActionKind::Offer],
            };

            let action = match timeout(
                self.config.turn_timeout,
                party.addr.choose_action(&legal_actions, timeline),
            )
            .await
            {
                Ok(Ok(action)) => action,
                Ok(Err(e)) => {
                    log::warn!("Party '{}' failed its turn. {e}", party.id);
                    record.error(&party.id, e);
                    break Outcome::Failure;
                }
                Err(_) => {
                    let e = SessionError::TurnTimeout {
                        party: party.id.clone(),
                        timeout: self.config.turn_timeout,
                    };
                    log::warn!("{e}");
                    record.error(&party.id, e.into());
                    break Outcome::Failure;
                }
            };

            log::debug!("Turn {turn}: party '{}' {action}.", party.id);
            record.action(&party.id, timeline.fraction(), action.clone());

            let sender = Sender::Party(party.id.clone());
            for other in self.parties.iter().filter(|other| other.id != party.id) {
                if let Err(e) = other.addr.receive_message(&sender, &action).await {
                    log::warn!("Party '{}' failed to process message. {e}", other.id);
                    record.error(&other.id, e);
                }
            }

            match action {
                Action::Offer(bid) => {
                    standing = Some(bid);
                    accepts = 0;
                }
                Action::Accept => {
                    accepts += 1;
                    if accepts == count - 1 {
                        break Outcome::Agreement;
                    }
                }
            }
            turn += 1;
        };

        let agreement = match outcome {
            Outcome::Agreement => standing,
            _ => None,
        };

        for party in self.parties.iter() {
            if let Err(e) = party.addr.negotiation_ended(agreement.as_ref()).await {
                record.error(&party.id, e);
            }
        }

        match &agreement {
            Some(bid) => log::info!("Parties agreed on {bid}."),
            None => log::info!("Negotiations ended without agreement ({outcome})."),
        }

        record.finish(outcome, agreement);
        Ok(record)
    }
}

impl FrameworkError {
    pub fn from(error: impl Into<anyhow::Error>, record: &NegotiationRecord) -> FrameworkError {
        FrameworkError {
            error: error.into(),
            negotiation_traceback: record.clone(),
        }
    }
}

impl fmt::Debug for FrameworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
