use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use groupn_domain::{rank_issues, Bid, UtilityOracle};
use groupn_party_component::{
    Action, ActionKind, NegotiationParty, PartyContext, PartyFactory, PartyId, Sender, Timeline,
};
use groupn_strategies::{
    BidSelector, CandidatePool, ConcessionPolicy, LowestDisagreed, OpponentModel, PoolConfig,
};

/// How the agent looks for its next offer, when opponent's offer isn't good enough.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidStrategy {
    /// Best rated bid from the candidate pool.
    Rated,
    /// Concede the least important disagreed issue of the current bid.
    LowestDisagreed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub pool: PoolConfig,
    pub deviation_importance: f64,
    pub strategy: BidStrategy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            pool: PoolConfig::default(),
            deviation_importance: 1.0,
            strategy: BidStrategy::Rated,
        }
    }
}

impl AgentConfig {
    /// Missing (null) config means defaults.
    pub fn from_yaml(config: serde_yaml::Value) -> anyhow::Result<AgentConfig> {
        Ok(match config {
            serde_yaml::Value::Null => AgentConfig::default(),
            config => serde_yaml::from_value(config)?,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("Party '{id}' can't be initialized. {source}")]
    Initialization {
        id: PartyId,
        #[source]
        source: groupn_domain::Error,
    },
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionState {
    AwaitingTurn,
    MustOpenRound,
    Deciding,
    Terminal,
}

/// Negotiation party conceding over time towards its reservation value.
/// In each turn it either accepts the last offer on the table, or offers the
/// candidate bid, that opponents are predicted to like the most.
pub struct NegotiationAgent {
    id: PartyId,
    oracle: Arc<dyn UtilityOracle + Send + Sync>,

    issue_weights: Vec<f64>,
    /// Own issues from the most to the least important.
    issue_order: Vec<usize>,
    optimal_bid: Bid,
    /// Best bid found so far. Starts as optimal bid.
    own_bid: Bid,

    policy: ConcessionPolicy,
    pool: CandidatePool,
    selector: BidSelector,
    strategy: BidStrategy,
    lowest_disagreed: LowestDisagreed,

    opponents: BTreeMap<PartyId, OpponentModel>,
    latest_bid: Option<Bid>,
    latest_utility: f64,
    target_utility: f64,
    state: DecisionState,
}

impl NegotiationAgent {
    pub fn new(ctx: PartyContext, config: AgentConfig) -> Result<NegotiationAgent, AgentError> {
        let PartyContext { id, oracle } = ctx;
        let init_error = |source| AgentError::Initialization {
            id: id.clone(),
            source,
        };

        let optimal_bid = oracle.optimal_bid().map_err(init_error)?;
        let max_utility = oracle.utility(&optimal_bid).map_err(init_error)?;
        let issue_weights = (0..oracle.issue_count())
            .map(|issue| oracle.weight(issue))
            .collect::<Result<Vec<_>, _>>()
            .map_err(init_error)?;
        let issue_order = rank_issues(&issue_weights);
        let pool = CandidatePool::build(&*oracle, &config.pool).map_err(init_error)?;

        let policy = ConcessionPolicy::new(oracle.discount_factor(), oracle.reservation_value());

        log::info!("Party '{id}': weights {issue_weights:?}, order {issue_order:?}.");
        log::info!(
            "Party '{id}': max utility {max_utility}, discount {}, reservation point {}.",
            policy.discount_factor,
            policy.reservation_value
        );
        log::debug!(
            "Party '{id}': {} candidate bids, strategy {}.",
            pool.len(),
            config.strategy
        );

        Ok(NegotiationAgent {
            lowest_disagreed: LowestDisagreed::new(issue_order.clone()),
            own_bid: optimal_bid.clone(),
            target_utility: max_utility,
            selector: BidSelector::new(config.deviation_importance),
            strategy: config.strategy,
            opponents: BTreeMap::new(),
            latest_bid: None,
            latest_utility: 0.0,
            state: DecisionState::AwaitingTurn,
            id,
            oracle,
            issue_weights,
            issue_order,
            optimal_bid,
            policy,
            pool,
        })
    }

    /// Decides what to do in this turn. Never fails: if nothing better can be
    /// found, agent offers its optimal bid.
    pub fn decide(&mut self, legal_actions: &[ActionKind], timeline: &Timeline) -> Action {
        self.state = if legal_actions.contains(&ActionKind::Accept) {
            DecisionState::Deciding
        } else {
            // Nothing on the table yet.
            DecisionState::MustOpenRound
        };

        let action = if self.state == DecisionState::MustOpenRound {
            log::debug!("Party '{}': opening with optimal bid.", self.id);
            Action::Offer(self.optimal_bid.clone())
        } else {
            self.target_utility = self.policy.threshold(timeline.fraction());
            if legal_actions.contains(&ActionKind::Offer) {
                self.accept_or_offer()
            } else {
                Action::Accept
            }
        };

        self.state = match action {
            Action::Accept => DecisionState::Terminal,
            Action::Offer(_) => DecisionState::AwaitingTurn,
        };
        action
    }

    fn accept_or_offer(&mut self) -> Action {
        if let Some(latest) = &self.latest_bid {
            if self.latest_utility >= self.target_utility {
                log::info!(
                    "Party '{}': accepting {latest} with utility {:.3} (target {:.3}).",
                    self.id,
                    self.latest_utility,
                    self.target_utility
                );
                return Action::Accept;
            }
        }

        let bid = self.next_bid();
        if self.latest_bid.as_ref() == Some(&bid) {
            log::info!(
                "Party '{}': best bid is the one on the table, accepting.",
                self.id
            );
            return Action::Accept;
        }

        log::debug!(
            "Party '{}': offering {bid} (target {:.3}).",
            self.id,
            self.target_utility
        );
        Action::Offer(bid)
    }

    fn next_bid(&mut self) -> Bid {
        let opponents = self.opponents.values().collect::<Vec<_>>();

        match self.strategy {
            BidStrategy::Rated => {
                match self.selector.select(
                    &self.pool,
                    &*self.oracle,
                    self.target_utility,
                    &opponents,
                ) {
                    Ok(bid) => self.own_bid = bid.clone(),
                    Err(e) => {
                        log::info!(
                            "Party '{}': {e} Falling back to optimal bid.",
                            self.id
                        );
                        self.own_bid = self.optimal_bid.clone();
                    }
                }
            }
            BidStrategy::LowestDisagreed => {
                let candidate = self.lowest_disagreed.concede(&self.own_bid, &opponents);
                let utility = self.oracle.utility(&candidate).unwrap_or_else(|e| {
                    log::warn!("Party '{}': {e}", self.id);
                    0.0
                });

                if utility >= self.target_utility {
                    self.own_bid = candidate;
                }
            }
        }
        self.own_bid.clone()
    }

    /// Handles action of another party. Updates model of the sender and
    /// remembers offered bid as the one currently on the table.
    pub fn observe(&mut self, sender: &Sender, action: &Action) {
        let id = match sender {
            Sender::Protocol => {
                log::debug!("Party '{}': ignoring message from protocol.", self.id);
                return;
            }
            Sender::Party(id) => id,
        };

        let issue_count = self.issue_weights.len();
        let model = self.opponents.entry(id.clone()).or_insert_with(|| {
            log::info!("New opponent '{id}'.");
            OpponentModel::new(id.as_str(), issue_count)
        });

        if let Some(bid) = action.bid() {
            model.update(bid.clone());
            if model.bids().len() == 1 {
                match model.mutual_value(&*self.oracle) {
                    Ok(value) => {
                        log::debug!("Party '{}': mutual value with '{id}': {value:.3}.", self.id)
                    }
                    Err(e) => log::debug!("Party '{}': no mutual value with '{id}'. {e}", self.id),
                }
            }

            self.latest_utility = match self.oracle.utility(bid) {
                Ok(utility) => utility,
                Err(e) => {
                    log::warn!(
                        "Party '{}': couldn't calculate utility of bid {bid}. {e}",
                        self.id
                    );
                    0.0
                }
            };
            self.latest_bid = Some(bid.clone());
        }
    }

    pub fn state(&self) -> DecisionState {
        self.state
    }

    pub fn target_utility(&self) -> f64 {
        self.target_utility
    }

    pub fn own_bid(&self) -> &Bid {
        &self.own_bid
    }

    pub fn optimal_bid(&self) -> &Bid {
        &self.optimal_bid
    }

    pub fn issue_order(&self) -> &[usize] {
        &self.issue_order
    }

    pub fn latest_bid(&self) -> Option<&Bid> {
        self.latest_bid.as_ref()
    }

    pub fn opponent(&self, id: &PartyId) -> Option<&OpponentModel> {
        self.opponents.get(id)
    }

    pub fn opponent_count(&self) -> usize {
        self.opponents.len()
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }
}

impl PartyFactory<NegotiationAgent> for NegotiationAgent {
    fn new(ctx: PartyContext, config: serde_yaml::Value) -> anyhow::Result<NegotiationAgent> {
        let config = AgentConfig::from_yaml(config)?;
        Ok(NegotiationAgent::new(ctx, config)?)
    }
}

impl NegotiationParty for NegotiationAgent {
    fn id(&self) -> &PartyId {
        &self.id
    }

    fn choose_action(
        &mut self,
        legal_actions: &[ActionKind],
        timeline: &Timeline,
    ) -> anyhow::Result<Action> {
        Ok(self.decide(legal_actions, timeline))
    }

    fn receive_message(&mut self, sender: &Sender, action: &Action) -> anyhow::Result<()> {
        self.observe(sender, action);
        Ok(())
    }

    fn negotiation_ended(&mut self, agreement: Option<&Bid>) -> anyhow::Result<()> {
        match agreement {
            Some(bid) => log::info!(
                "Party '{}': negotiations ended with agreement {bid}.",
                self.id
            ),
            None => log::info!("Party '{}': negotiations ended without agreement.", self.id),
        }
        self.state = DecisionState::Terminal;
        Ok(())
    }
}
