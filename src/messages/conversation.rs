use super::types::{Part, Turn};
use uuid::Uuid;

/// Ordered transcript. Turns are only appended, removed, or have the text of
/// a streaming model turn replaced.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn get(&self, id: Uuid) -> Option<&Turn> {
        self.turns.iter().find(|turn| turn.id == id)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Replace the content of a turn with a single text part.
    ///
    /// Returns `false` if no turn has this id.
    pub fn replace_text(&mut self, id: Uuid, text: impl Into<String>) -> bool {
        match self.turns.iter_mut().find(|turn| turn.id == id) {
            Some(turn) => {
                turn.parts = vec![Part::Text(text.into())];
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Turn> {
        let index = self.turns.iter().position(|turn| turn.id == id)?;
        Some(self.turns.remove(index))
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
