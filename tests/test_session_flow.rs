use std::sync::Arc;
use std::time::Duration;

use groupn_negotiator::domain::{Bid, UtilityOracle};
use groupn_negotiator::{Action, PartyId};
use groupn_negotiator_testing::fixtures::*;
use groupn_negotiator_testing::{Deadline, Framework, NegotiationRecord, Outcome};

fn assert_offers_above_reservation(framework: &Framework, record: &NegotiationRecord) {
    for party in framework.parties.iter() {
        let reservation = party.oracle.reservation_value();
        for bid in record.offers_of(&party.id) {
            assert!(party.oracle.utility(bid).unwrap() >= reservation);
        }
    }
}

#[actix_rt::test]
async fn test_bilateral_agreement() {
    let framework = Framework::new_empty()
        .deadline(Deadline::Rounds(20))
        .add_party("Groupn", groupn_config(), three_issue_space())
        .unwrap()
        .add_party("Groupn", groupn_config(), opposing_space())
        .unwrap();

    let record = framework.run().await.unwrap();
    println!("{}", record);

    assert_eq!(record.outcome, Some(Outcome::Agreement));
    assert!(record.errors.is_empty());
    assert!(record.rounds <= 20);
    assert_eq!(
        record.turns[0].action,
        Action::Offer(Bid::from_values(["A", "B", "C"]))
    );
    assert_eq!(record.turns.last().unwrap().action, Action::Accept);

    let agreement = record.agreement.as_ref().unwrap();
    assert!(framework.utility("Groupn", agreement).unwrap() >= 0.1);
    assert!(framework.utility("Groupn#1", agreement).unwrap() >= 0.1);
    assert_offers_above_reservation(&framework, &record);
}

#[actix_rt::test]
async fn test_multilateral_session() {
    let framework = Framework::new_empty()
        .deadline(Deadline::Rounds(40))
        .add_party("Groupn", groupn_config(), three_issue_space())
        .unwrap()
        .add_party("Groupn", groupn_config(), opposing_space())
        .unwrap()
        .add_party("Groupn", groupn_config(), mediator_space())
        .unwrap();

    let record = framework.run().await.unwrap();
    println!("{}", record);

    assert!(record.errors.is_empty());
    assert_ne!(record.outcome, Some(Outcome::Failure));
    assert!(matches!(record.turns[0].action, Action::Offer(_)));
    assert_offers_above_reservation(&framework, &record);

    if let Some(agreement) = &record.agreement {
        // Both other parties accepted the last offer.
        let last = &record.turns[record.turns.len() - 2..];
        assert!(last.iter().all(|turn| turn.action == Action::Accept));

        for party in framework.parties.iter() {
            let utility = party.oracle.utility(agreement).unwrap();
            assert!(utility >= party.oracle.reservation_value());
        }
    }
}

#[actix_rt::test]
async fn test_no_agreement_below_reservation_value() {
    let framework = Framework::new_empty()
        .deadline(Deadline::Rounds(10))
        .add_party("Groupn", groupn_config(), three_issue_space())
        .unwrap()
        .add_party_with("Stubborn", Arc::new(opposing_space()), Stubborn::create)
        .unwrap();

    let record = framework.run().await.unwrap();

    // Stubborn offers (X, Y, Z), which is worth nothing to Groupn.
    assert_eq!(record.outcome, Some(Outcome::Deadline));
    assert_eq!(record.agreement, None);
    assert_eq!(record.rounds, 10);
    assert_eq!(record.turns.len(), 20);
    assert!(record
        .turns
        .iter()
        .all(|turn| matches!(turn.action, Action::Offer(_))));
    assert_offers_above_reservation(&framework, &record);
}

#[actix_rt::test]
async fn test_wall_clock_deadline() {
    let framework = Framework::new_empty()
        .deadline(Deadline::Time(Duration::from_millis(100)))
        .add_party("Groupn", groupn_config(), three_issue_space())
        .unwrap()
        .add_party_with("Stubborn", Arc::new(opposing_space()), Stubborn::create)
        .unwrap();

    let record = framework.run().await.unwrap();

    assert_eq!(record.outcome, Some(Outcome::Deadline));
    assert!(!record.turns.is_empty());
    assert!(record.turns.iter().all(|turn| turn.elapsed < 1.0));
}

#[actix_rt::test]
async fn test_failing_party_ends_session() {
    let framework = Framework::new_empty()
        .add_party("Groupn", groupn_config(), three_issue_space())
        .unwrap()
        .add_party_with("Broken", Arc::new(opposing_space()), Broken::create)
        .unwrap();

    let record = framework.run().await.unwrap();

    assert_eq!(record.outcome, Some(Outcome::Failure));
    assert_eq!(record.turns.len(), 1);
    assert_eq!(record.errors[&PartyId::new("Broken")].len(), 1);
}
