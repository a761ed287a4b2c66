//! Session statistics for the analytics view

use crate::feedback::{FeedbackLog, Rating};
use crate::messages::{Conversation, Role};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub user_turns: usize,
    pub model_turns: usize,
    pub attachments: usize,
    pub model_chars: usize,
    pub good_feedback: usize,
    pub bad_feedback: usize,
}

impl SessionStats {
    pub fn collect(conversation: &Conversation, feedback: &FeedbackLog) -> Self {
        let mut stats = Self {
            good_feedback: feedback.count(Rating::Good),
            bad_feedback: feedback.count(Rating::Bad),
            ..Default::default()
        };

        for turn in conversation.iter() {
            stats.attachments += turn.attachments().count();
            match turn.role {
                Role::User => stats.user_turns += 1,
                Role::Model => {
                    stats.model_turns += 1;
                    stats.model_chars += turn.text().chars().count();
                }
            }
        }

        stats
    }

    pub fn average_response_chars(&self) -> f32 {
        if self.model_turns == 0 {
            0.0
        } else {
            self.model_chars as f32 / self.model_turns as f32
        }
    }

    /// Share of rated responses marked good, if any were rated
    pub fn satisfaction(&self) -> Option<f32> {
        let rated = self.good_feedback + self.bad_feedback;
        (rated > 0).then(|| self.good_feedback as f32 / rated as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackDraft;
    use crate::messages::{InlineData, Part, Turn};

    #[test]
    fn test_empty_session() {
        let stats = SessionStats::collect(&Conversation::new(), &FeedbackLog::new());
        assert_eq!(stats, SessionStats::default());
        assert_eq!(stats.average_response_chars(), 0.0);
        assert_eq!(stats.satisfaction(), None);
    }

    #[test]
    fn test_counts_turns_and_attachments() {
        let mut conversation = Conversation::new();
        conversation.push(Turn::user(vec![
            Part::text("Is this lease valid?"),
            Part::InlineData(InlineData::from_bytes("image/png", b"img")),
        ]));
        conversation.push(Turn::new(Role::Model, vec![Part::text("abcd")]));
        conversation.push(Turn::user(vec![Part::text("Thanks")]));
        conversation.push(Turn::new(Role::Model, vec![Part::text("ab")]));

        let mut feedback = FeedbackLog::new();
        let mut draft = FeedbackDraft {
            rating: Some(Rating::Good),
            comments: String::new(),
        };
        feedback.record(draft.take().unwrap());

        let stats = SessionStats::collect(&conversation, &feedback);
        assert_eq!(stats.user_turns, 2);
        assert_eq!(stats.model_turns, 2);
        assert_eq!(stats.attachments, 1);
        assert_eq!(stats.model_chars, 6);
        assert_eq!(stats.average_response_chars(), 3.0);
        assert_eq!(stats.satisfaction(), Some(1.0));
    }
}
