//! Interview phases and the per-phase results mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed phases of an interview, in the order they are conducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Introduction,
    Project,
    Coding,
    Technical,
    Outro,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Introduction,
        Phase::Project,
        Phase::Coding,
        Phase::Technical,
        Phase::Outro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Introduction => "INTRODUCTION",
            Phase::Project => "PROJECT",
            Phase::Coding => "CODING",
            Phase::Technical => "TECHNICAL",
            Phase::Outro => "OUTRO",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open JSON object per phase, filled in while the interview runs.
pub type PhaseResults = BTreeMap<Phase, serde_json::Map<String, serde_json::Value>>;

/// A results mapping with every phase present and empty.
pub fn empty_results() -> PhaseResults {
    Phase::ALL
        .iter()
        .map(|phase| (*phase, serde_json::Map::new()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_results_has_every_phase() {
        let results = empty_results();
        assert_eq!(results.len(), 5);
        assert!(results.values().all(|entries| entries.is_empty()));

        let json = serde_json::to_value(&results).unwrap();
        for phase in Phase::ALL {
            assert!(json.get(phase.as_str()).is_some(), "missing {}", phase);
        }
    }

    #[test]
    fn test_phase_order() {
        assert!(Phase::Introduction < Phase::Project);
        assert!(Phase::Technical < Phase::Outro);
    }
}
