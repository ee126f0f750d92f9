use assert_matches::assert_matches;
use breach::campaign::{Campaign, DEFAULT_CAMPAIGN};
use breach::clock::SessionClock;
use breach::error::CampaignError;
use breach::round::{RoundController, RoundStatus, SubmitOutcome};

#[test]
fn every_builtin_campaign_validates() {
    let names = Campaign::builtin_names();
    assert!(names.contains(&DEFAULT_CAMPAIGN.to_string()));
    for name in names {
        let campaign = Campaign::builtin(&name).unwrap();
        assert!(!campaign.is_empty(), "{name} has no rounds");
        assert!(campaign.session_seconds > 0);
    }
}

#[test]
fn every_round_accepts_its_own_answer() {
    let campaign = Campaign::builtin(DEFAULT_CAMPAIGN).unwrap();
    let clock = SessionClock::new(campaign.session_seconds);
    for config in &campaign.rounds {
        let answer = format!("\t{}  ", config.canonical_answer.to_lowercase());
        let mut round = RoundController::new(config.clone(), clock.subscribe());
        // one miss first, then the answer still lands
        round.submit("definitely not it");
        assert_matches!(round.submit(&answer), SubmitOutcome::Accepted { .. });
        assert_eq!(round.status(), RoundStatus::Complete);
    }
}

#[test]
fn every_round_locks_after_its_budget() {
    let campaign = Campaign::builtin(DEFAULT_CAMPAIGN).unwrap();
    let clock = SessionClock::new(campaign.session_seconds);
    for config in &campaign.rounds {
        let mut round = RoundController::new(config.clone(), clock.subscribe());
        for k in 1..=config.max_attempts {
            let outcome = round.submit("");
            if k < config.max_attempts {
                assert_eq!(
                    outcome,
                    SubmitOutcome::Rejected {
                        attempts_remaining: config.max_attempts - k
                    }
                );
            } else {
                assert_eq!(outcome, SubmitOutcome::LockedOut);
            }
        }
        assert_eq!(round.status(), RoundStatus::Locked);
    }
}

#[test]
fn routes_chain_rounds_in_order() {
    let campaign = Campaign::builtin(DEFAULT_CAMPAIGN).unwrap();
    for pair in campaign.rounds.windows(2) {
        assert!(pair[0].next_route.ends_with(&pair[1].id.to_string()));
    }
}

#[test]
fn campaign_file_errors_are_typed() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert_matches!(
        Campaign::from_path(&missing),
        Err(CampaignError::Io { path, .. }) if path == missing
    );

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert_matches!(Campaign::from_path(&broken), Err(CampaignError::Json(_)));

    assert_matches!(Campaign::builtin("nope"), Err(CampaignError::NotFound(_)));
}
