use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

use crate::error::CampaignError;
use crate::validator::normalize;

static CAMPAIGN_DIR: Dir = include_dir!("src/campaigns");

pub const DEFAULT_CAMPAIGN: &str = "behind_the_crime";

const REMAINING_PLACEHOLDER: &str = "{remaining}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Extra failure copy shown as the budget runs low.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    /// Appended when the remaining attempts reach 2.
    #[serde(default)]
    pub warning: Option<String>,
    /// Appended when the remaining attempts reach 1.
    #[serde(default)]
    pub critical: Option<String>,
}

/// Static content and limits of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub id: u32,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub riddle: Vec<String>,
    #[serde(default)]
    pub answer_format: String,
    pub canonical_answer: String,
    pub max_attempts: u32,
    #[serde(default)]
    pub max_hints: usize,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub boot_lines: Vec<String>,
    #[serde(default)]
    pub success_lines: Vec<String>,
    #[serde(default = "default_failure_line")]
    pub failure_line: String,
    #[serde(default)]
    pub escalation: Escalation,
    #[serde(default)]
    pub lockdown_lines: Vec<String>,
    #[serde(default)]
    pub expiry_lines: Vec<String>,
    #[serde(default = "default_locked_message")]
    pub locked_message: String,
    /// Opaque identifier of the next round's entry point.
    #[serde(default)]
    pub next_route: String,
    #[serde(default)]
    pub next_label: String,
}

fn default_failure_line() -> String {
    format!("ACCESS DENIED - {REMAINING_PLACEHOLDER} attempts remaining")
}

fn default_locked_message() -> String {
    "SYSTEM LOCKED. Please contact security administrator.".to_string()
}

impl RoundConfig {
    /// Failure copy with the remaining count filled in. Templates without a
    /// placeholder get the count appended.
    pub fn failure_message(&self, remaining: u32) -> String {
        if self.failure_line.contains(REMAINING_PLACEHOLDER) {
            self.failure_line
                .replace(REMAINING_PLACEHOLDER, &remaining.to_string())
        } else {
            format!("{} ({remaining} attempts remaining)", self.failure_line)
        }
    }

    /// Escalation line for the count the budget just dropped to, if any.
    pub fn escalation_for(&self, remaining: u32) -> Option<&str> {
        match remaining {
            2 => self.escalation.warning.as_deref(),
            1 => self.escalation.critical.as_deref(),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), CampaignError> {
        if normalize(&self.canonical_answer).is_empty() {
            return Err(CampaignError::Invalid(format!(
                "round {} has an empty answer",
                self.id
            )));
        }
        if self.max_attempts == 0 {
            return Err(CampaignError::Invalid(format!(
                "round {} has no attempts",
                self.id
            )));
        }
        if self.hints.len() < self.max_hints {
            return Err(CampaignError::Invalid(format!(
                "round {} caps hints at {} but defines {}",
                self.id,
                self.max_hints,
                self.hints.len()
            )));
        }
        Ok(())
    }
}

/// Ordered rounds plus session timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub synopsis: Vec<String>,
    pub briefing_seconds: u64,
    pub session_seconds: u64,
    pub rounds: Vec<RoundConfig>,
}

impl Campaign {
    /// Loads and validates an embedded campaign by name.
    pub fn builtin(name: &str) -> Result<Self, CampaignError> {
        let file = CAMPAIGN_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| CampaignError::NotFound(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| CampaignError::Invalid(format!("{name}.json is not utf-8")))?;
        Self::from_json(contents)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CampaignError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CampaignError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, CampaignError> {
        let campaign: Campaign = from_str(json)?;
        campaign.validate()?;
        Ok(campaign)
    }

    /// Names of the embedded campaigns, sorted.
    pub fn builtin_names() -> Vec<String> {
        CAMPAIGN_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .filter_map(|s| s.to_str())
            .map(str::to_string)
            .sorted()
            .collect()
    }

    pub fn validate(&self) -> Result<(), CampaignError> {
        if self.rounds.is_empty() {
            return Err(CampaignError::Invalid(format!(
                "campaign {} has no rounds",
                self.name
            )));
        }
        if let Some(pos) = self
            .rounds
            .iter()
            .enumerate()
            .position(|(i, r)| r.id as usize != i + 1)
        {
            return Err(CampaignError::Invalid(format!(
                "round ids must run 1..={} in order, found {} at position {}",
                self.rounds.len(),
                self.rounds[pos].id,
                pos + 1
            )));
        }
        self.rounds.iter().try_for_each(RoundConfig::validate)
    }

    pub fn round(&self, id: u32) -> Option<&RoundConfig> {
        self.rounds.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn minimal_round(id: u32) -> RoundConfig {
        RoundConfig {
            id,
            title: format!("Round {id}"),
            difficulty: Difficulty::Easy,
            summary: String::new(),
            riddle: vec![],
            answer_format: String::new(),
            canonical_answer: "KEY-231-LAB".to_string(),
            max_attempts: 3,
            max_hints: 0,
            hints: vec![],
            boot_lines: vec![],
            success_lines: vec![],
            failure_line: default_failure_line(),
            escalation: Escalation::default(),
            lockdown_lines: vec![],
            expiry_lines: vec![],
            locked_message: default_locked_message(),
            next_route: String::new(),
            next_label: String::new(),
        }
    }

    fn campaign(rounds: Vec<RoundConfig>) -> Campaign {
        Campaign {
            name: "test".to_string(),
            title: "TEST".to_string(),
            synopsis: vec![],
            briefing_seconds: 60,
            session_seconds: 600,
            rounds,
        }
    }

    #[test]
    fn test_builtin_campaign_loads() {
        let c = Campaign::builtin(DEFAULT_CAMPAIGN).unwrap();
        assert_eq!(c.name, DEFAULT_CAMPAIGN);
        assert_eq!(c.len(), 7);
        assert_eq!(c.session_seconds, 7200);
        assert_eq!(c.briefing_seconds, 1680);
        assert_eq!(c.round(3).unwrap().canonical_answer, "THETA-231-OMEGA");
        assert_eq!(c.round(4).unwrap().max_hints, 3);
        assert_eq!(c.round(2).unwrap().max_hints, 0);
    }

    #[test]
    fn test_builtin_budgets_are_three_or_five() {
        let c = Campaign::builtin(DEFAULT_CAMPAIGN).unwrap();
        assert!(c.rounds.iter().all(|r| r.max_attempts == 3 || r.max_attempts == 5));
    }

    #[test]
    fn test_builtin_names_lists_default() {
        assert!(Campaign::builtin_names().contains(&DEFAULT_CAMPAIGN.to_string()));
    }

    #[test]
    fn test_unknown_builtin() {
        assert_matches!(
            Campaign::builtin("nope"),
            Err(CampaignError::NotFound(name)) if name == "nope"
        );
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let json = r#"{
            "name": "tiny",
            "title": "TINY",
            "briefing_seconds": 10,
            "session_seconds": 30,
            "rounds": [
                { "id": 1, "title": "Only", "difficulty": "hard",
                  "canonical_answer": "a-b-c", "max_attempts": 3 }
            ]
        }"#;
        let c = Campaign::from_json(json).unwrap();
        let r = c.round(1).unwrap();
        assert_eq!(r.max_hints, 0);
        assert_eq!(r.failure_message(2), "ACCESS DENIED - 2 attempts remaining");
        assert_eq!(r.difficulty.to_string(), "hard");
    }

    #[test]
    fn test_malformed_json() {
        assert_matches!(Campaign::from_json("{"), Err(CampaignError::Json(_)));
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert_matches!(Campaign::from_path(&path), Err(CampaignError::Io { .. }));
    }

    #[test]
    fn test_from_path_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let c = campaign(vec![minimal_round(1), minimal_round(2)]);
        fs::write(&path, serde_json::to_vec_pretty(&c).unwrap()).unwrap();
        assert_eq!(Campaign::from_path(&path).unwrap(), c);
    }

    #[test]
    fn test_validate_rejects_structural_errors() {
        assert_matches!(campaign(vec![]).validate(), Err(CampaignError::Invalid(_)));
        assert_matches!(
            campaign(vec![minimal_round(1), minimal_round(3)]).validate(),
            Err(CampaignError::Invalid(_))
        );

        let mut empty_answer = minimal_round(1);
        empty_answer.canonical_answer = "   ".to_string();
        assert_matches!(
            campaign(vec![empty_answer]).validate(),
            Err(CampaignError::Invalid(_))
        );

        let mut no_attempts = minimal_round(1);
        no_attempts.max_attempts = 0;
        assert_matches!(
            campaign(vec![no_attempts]).validate(),
            Err(CampaignError::Invalid(_))
        );

        let mut short_hints = minimal_round(1);
        short_hints.max_hints = 2;
        short_hints.hints = vec!["one".to_string()];
        assert_matches!(
            campaign(vec![short_hints]).validate(),
            Err(CampaignError::Invalid(_))
        );
    }

    #[test]
    fn test_failure_message_without_placeholder() {
        let mut r = minimal_round(1);
        r.failure_line = "SYNCHRONIZATION FAILED".to_string();
        assert_eq!(
            r.failure_message(1),
            "SYNCHRONIZATION FAILED (1 attempts remaining)"
        );
    }

    #[test]
    fn test_escalation_thresholds() {
        let mut r = minimal_round(1);
        r.escalation = Escalation {
            warning: Some("warn".to_string()),
            critical: Some("crit".to_string()),
        };
        assert_eq!(r.escalation_for(4), None);
        assert_eq!(r.escalation_for(3), None);
        assert_eq!(r.escalation_for(2), Some("warn"));
        assert_eq!(r.escalation_for(1), Some("crit"));
        assert_eq!(r.escalation_for(0), None);
    }
}
