//! Aggregates the scores the interviewer recorded in the results mapping.
//!
//! Each results entry may carry `assessment.score` (0–10, answers) or
//! `evaluation.RESULT` (coding, counted as 10 when passing, 0 otherwise).
//! Entries with neither are listed but not scored.

use crate::interview::phase::{Phase, PhaseResults};
use crate::services::{has_passing_verdict, Analyzer};
use serde_json::{json, Value};

const PROCEED_THRESHOLD: f64 = 7.0;
const BORDERLINE_THRESHOLD: f64 = 5.0;

#[derive(Debug, Default)]
pub struct ScoreAnalyzer;

impl ScoreAnalyzer {
    fn entry_score(entry: &Value) -> Option<f64> {
        if let Some(score) = entry.pointer("/assessment/score").and_then(Value::as_f64) {
            return Some(score.clamp(0.0, 10.0));
        }
        entry
            .get("evaluation")
            .map(|outcome| if has_passing_verdict(outcome) { 10.0 } else { 0.0 })
    }

    fn phase_average(entries: &serde_json::Map<String, Value>) -> Option<f64> {
        let scores: Vec<f64> = entries.values().filter_map(Self::entry_score).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    fn phase_averages(results: &PhaseResults) -> Vec<(Phase, f64)> {
        results
            .iter()
            .filter_map(|(phase, entries)| Self::phase_average(entries).map(|avg| (*phase, avg)))
            .collect()
    }
}

impl Analyzer for ScoreAnalyzer {
    fn analyze(&self, results: &PhaseResults) -> Value {
        let mut phases = serde_json::Map::new();
        for (phase, entries) in results {
            let feedback: Vec<Value> = entries
                .iter()
                .map(|(question, entry)| {
                    json!({
                        "question": question,
                        "score": Self::entry_score(entry),
                        "feedback": entry
                            .pointer("/assessment/feedback")
                            .or_else(|| entry.pointer("/evaluation/FEEDBACK"))
                            .cloned()
                            .unwrap_or(Value::Null),
                    })
                })
                .collect();

            phases.insert(
                phase.to_string(),
                json!({
                    "questions": entries.len(),
                    "average_score": Self::phase_average(entries),
                    "answers": feedback,
                }),
            );
        }
        Value::Object(phases)
    }

    fn summarize(&self, results: &PhaseResults) -> Value {
        let averages = Self::phase_averages(results);
        if averages.is_empty() {
            return json!({
                "overall_score": null,
                "phase_scores": {},
                "strongest_phase": null,
                "weakest_phase": null,
                "recommendation": "insufficient data",
            });
        }

        let overall = averages.iter().map(|(_, avg)| avg).sum::<f64>() / averages.len() as f64;
        let strongest = averages.iter().max_by(|a, b| a.1.total_cmp(&b.1)).map(|(p, _)| p.to_string());
        let weakest = averages.iter().min_by(|a, b| a.1.total_cmp(&b.1)).map(|(p, _)| p.to_string());
        let phase_scores: serde_json::Map<String, Value> = averages
            .iter()
            .map(|(phase, avg)| (phase.to_string(), json!(avg)))
            .collect();

        let recommendation = if overall >= PROCEED_THRESHOLD {
            "proceed"
        } else if overall >= BORDERLINE_THRESHOLD {
            "borderline"
        } else {
            "do not proceed"
        };

        json!({
            "overall_score": overall,
            "phase_scores": phase_scores,
            "strongest_phase": strongest,
            "weakest_phase": weakest,
            "recommendation": recommendation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::phase::empty_results;

    fn sample_results() -> PhaseResults {
        let mut results = empty_results();
        let intro = results.get_mut(&Phase::Introduction).unwrap();
        intro.insert("Q1".into(), json!({"answer": "a", "assessment": {"score": 8, "feedback": "clear"}}));
        intro.insert("Q2".into(), json!({"answer": "b", "assessment": {"score": 6}}));
        results
            .get_mut(&Phase::Coding)
            .unwrap()
            .insert("Reverse".into(), json!({"evaluation": {"RESULT": false, "FEEDBACK": "fails on empty"}}));
        results
    }

    #[test]
    fn test_analyze_per_phase() {
        let analysis = ScoreAnalyzer.analyze(&sample_results());
        assert_eq!(analysis["INTRODUCTION"]["questions"], 2);
        assert_eq!(analysis["INTRODUCTION"]["average_score"], 7.0);
        assert_eq!(analysis["CODING"]["average_score"], 0.0);
        assert_eq!(analysis["CODING"]["answers"][0]["feedback"], "fails on empty");
        assert!(analysis["OUTRO"]["average_score"].is_null());
    }

    #[test]
    fn test_summarize() {
        let summary = ScoreAnalyzer.summarize(&sample_results());
        assert_eq!(summary["overall_score"], 3.5);
        assert_eq!(summary["strongest_phase"], "INTRODUCTION");
        assert_eq!(summary["weakest_phase"], "CODING");
        assert_eq!(summary["recommendation"], "do not proceed");
    }

    #[test]
    fn test_summarize_empty() {
        let summary = ScoreAnalyzer.summarize(&empty_results());
        assert_eq!(summary["recommendation"], "insufficient data");
        assert!(summary["overall_score"].is_null());
    }
}
