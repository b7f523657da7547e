use actix::prelude::*;
use actix::{Actor, Context, Handler};
use anyhow::Result;

use groupn_party_component::{
    Action, ActionKind, Bid, NegotiationParty, PartyId, Sender, Timeline,
};

// =========================================== //
// Party interface
// =========================================== //

/// Asks party to take its turn.
#[derive(Message)]
#[rtype(result = "Result<Action>")]
pub struct ChooseAction {
    pub legal_actions: Vec<ActionKind>,
    pub timeline: Timeline,
}

/// Action taken by another party (or protocol message).
#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct ReceiveMessage {
    pub sender: Sender,
    pub action: Action,
}

#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct NegotiationEnded {
    pub agreement: Option<Bid>,
}

/// Actor owning a single party. Messages are processed one by one, so the
/// party never observes concurrent calls.
pub struct PartyActor {
    party: Box<dyn NegotiationParty>,
}

impl PartyActor {
    pub fn new(party: Box<dyn NegotiationParty>) -> PartyActor {
        PartyActor { party }
    }
}

impl Actor for PartyActor {
    type Context = Context<Self>;
}

impl Handler<ChooseAction> for PartyActor {
    type Result = Result<Action>;

    fn handle(&mut self, msg: ChooseAction, _: &mut Context<Self>) -> Self::Result {
        let action = self
            .party
            .choose_action(&msg.legal_actions, &msg.timeline)?;

        if !msg.legal_actions.contains(&action.kind()) {
            anyhow::bail!(
                "Party '{}' chose illegal action {} (allowed: {:?}).",
                self.party.id(),
                action,
                msg.legal_actions
            );
        }
        Ok(action)
    }
}

impl Handler<ReceiveMessage> for PartyActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: ReceiveMessage, _: &mut Context<Self>) -> Self::Result {
        self.party.receive_message(&msg.sender, &msg.action)
    }
}

impl Handler<NegotiationEnded> for PartyActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: NegotiationEnded, _: &mut Context<Self>) -> Self::Result {
        self.party.negotiation_ended(msg.agreement.as_ref())
    }
}

#[derive(Clone)]
pub struct PartyAddr {
    pub id: PartyId,
    pub on_choose: Recipient<ChooseAction>,
    pub on_message: Recipient<ReceiveMessage>,
    pub on_end: Recipient<NegotiationEnded>,
}

impl PartyAddr {
    pub async fn choose_action(
        &self,
        legal_actions: &[ActionKind],
        timeline: Timeline,
    ) -> Result<Action> {
        self.on_choose
            .send(ChooseAction {
                legal_actions: legal_actions.to_vec(),
                timeline,
            })
            .await?
    }

    pub async fn receive_message(&self, sender: &Sender, action: &Action) -> Result<()> {
        self.on_message
            .send(ReceiveMessage {
                sender: sender.clone(),
                action: action.clone(),
            })
            .await?
    }

    pub async fn negotiation_ended(&self, agreement: Option<&Bid>) -> Result<()> {
        self.on_end
            .send(NegotiationEnded {
                agreement: agreement.cloned(),
            })
            .await?
    }

    /// Starts party actor in current arbiter.
    pub fn from(party: Box<dyn NegotiationParty>) -> PartyAddr {
        let id = party.id().clone();
        let addr = PartyActor::new(party).start();
        PartyAddr {
            id,
            on_choose: addr.clone().recipient(),
            on_message: addr.clone().recipient(),
            on_end: addr.recipient(),
        }
    }
}
