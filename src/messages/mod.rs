pub mod conversation;
pub mod types;

pub use conversation::Conversation;
pub use types::{InlineData, Part, Role, Turn};
