//! crates/study_assistant_core/src/metrics.rs
//!
//! Aggregations over a user's quiz attempts: per-topic averages (knowledge gaps),
//! the progress series, and the dashboard headline numbers.
//!
//! Every function here expects attempts ordered most recent first, which is the
//! order `DatabaseService::list_attempts` returns.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

use crate::domain::QuizAttempt;
use crate::scoring::percentage;

/// Upper bound of every percentage score.
pub const FULL_MARK: f64 = 100.0;

/// Topics averaging below this percentage count as knowledge gaps.
pub const KNOWLEDGE_GAP_THRESHOLD: f64 = 70.0;

/// The mean percentage score for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TopicScore {
    pub topic: String,
    pub average: f64,
    pub attempts: usize,
    pub full_mark: f64,
}

/// One point of the progress chart.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProgressPoint {
    pub attempt_time: DateTime<Utc>,
    pub topic: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub topics_studied: usize,
    pub average_score: i64,
    pub quizzes_taken: usize,
    pub latest_score_change: i64,
}

fn attempt_percentage(attempt: &QuizAttempt) -> f64 {
    percentage(attempt.score, attempt.total_questions)
}

/// Groups attempts by topic and averages their percentage scores.
///
/// Topics appear in the order they are first seen.
pub fn knowledge_gaps(attempts: &[QuizAttempt]) -> Vec<TopicScore> {
    let mut order: Vec<&str> = Vec::new();
    let mut scores: HashMap<&str, Vec<f64>> = HashMap::new();

    for attempt in attempts {
        let entry = scores.entry(attempt.topic.as_str()).or_insert_with(|| {
            order.push(attempt.topic.as_str());
            Vec::new()
        });
        entry.push(attempt_percentage(attempt));
    }

    order
        .into_iter()
        .map(|topic| {
            let topic_scores = &scores[topic];
            TopicScore {
                topic: topic.to_string(),
                average: topic_scores.iter().sum::<f64>() / topic_scores.len() as f64,
                attempts: topic_scores.len(),
                full_mark: FULL_MARK,
            }
        })
        .collect()
}

/// Topics whose average falls below `threshold`, weakest first.
pub fn weakest_topics(attempts: &[QuizAttempt], threshold: f64) -> Vec<TopicScore> {
    let mut weak: Vec<TopicScore> = knowledge_gaps(attempts)
        .into_iter()
        .filter(|t| t.average < threshold)
        .collect();
    weak.sort_by(|a, b| a.average.total_cmp(&b.average));
    weak
}

/// Percentage score per attempt, oldest first.
pub fn progress(attempts: &[QuizAttempt]) -> Vec<ProgressPoint> {
    attempts
        .iter()
        .rev()
        .map(|a| ProgressPoint {
            attempt_time: a.attempt_time,
            topic: a.topic.clone(),
            score: attempt_percentage(a),
        })
        .collect()
}

pub fn dashboard(attempts: &[QuizAttempt]) -> DashboardStats {
    if attempts.is_empty() {
        return DashboardStats::default();
    }

    let topics: HashSet<&str> = attempts.iter().map(|a| a.topic.as_str()).collect();
    let total: f64 = attempts.iter().map(attempt_percentage).sum();
    let average = total / attempts.len() as f64;

    let latest_change = match attempts {
        [latest, previous, ..] => attempt_percentage(latest) - attempt_percentage(previous),
        _ => 0.0,
    };

    DashboardStats {
        topics_studied: topics.len(),
        average_score: average.round() as i64,
        quizzes_taken: attempts.len(),
        latest_score_change: latest_change.round() as i64,
    }
}
