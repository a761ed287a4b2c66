//! Response feedback collection
//!
//! Kept in memory for the session and written to the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: Rating,
    pub comments: String,
    pub submitted_at: DateTime<Utc>,
}

/// What the feedback dialog is editing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackDraft {
    pub rating: Option<Rating>,
    pub comments: String,
}

impl FeedbackDraft {
    pub fn can_submit(&self) -> bool {
        self.rating.is_some()
    }

    /// Turn the draft into a record and reset it. `None` without a rating.
    pub fn take(&mut self) -> Option<Feedback> {
        let rating = self.rating?;
        let comments = std::mem::take(&mut self.comments).trim().to_string();
        self.rating = None;
        Some(Feedback {
            rating,
            comments,
            submitted_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackLog {
    entries: Vec<Feedback>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, feedback: Feedback) {
        info!(
            "Feedback received: rating={:?}, comment_chars={}",
            feedback.rating,
            feedback.comments.chars().count()
        );
        self.entries.push(feedback);
    }

    pub fn entries(&self) -> &[Feedback] {
        &self.entries
    }

    pub fn count(&self, rating: Rating) -> usize {
        self.entries.iter().filter(|f| f.rating == rating).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_requires_rating() {
        let mut draft = FeedbackDraft {
            rating: None,
            comments: "nice".to_string(),
        };
        assert!(!draft.can_submit());
        assert!(draft.take().is_none());
        assert_eq!(draft.comments, "nice");
    }

    #[test]
    fn test_draft_resets_after_take() {
        let mut draft = FeedbackDraft {
            rating: Some(Rating::Good),
            comments: "  clear answer  ".to_string(),
        };
        let feedback = draft.take().unwrap();
        assert_eq!(feedback.rating, Rating::Good);
        assert_eq!(feedback.comments, "clear answer");
        assert_eq!(draft, FeedbackDraft::default());
    }

    #[test]
    fn test_log_counts() {
        let mut log = FeedbackLog::new();
        for rating in [Rating::Good, Rating::Bad, Rating::Good] {
            let mut draft = FeedbackDraft {
                rating: Some(rating),
                comments: String::new(),
            };
            log.record(draft.take().unwrap());
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.count(Rating::Good), 2);
        assert_eq!(log.count(Rating::Bad), 1);
    }
}
