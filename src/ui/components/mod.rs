//! UI components

pub mod analytics_view;
pub mod emotion_panel;
pub mod error_toast;
pub mod feedback_modal;
pub mod input_bar;
pub mod markdown;
pub mod message_list;
pub mod privacy_modal;
pub mod side_menu;

pub use analytics_view::AnalyticsView;
pub use emotion_panel::EmotionPanel;
pub use error_toast::ErrorToast;
pub use feedback_modal::FeedbackModal;
pub use input_bar::InputBar;
pub use message_list::{ImageCache, MessageList};
pub use privacy_modal::PrivacyModal;
pub use side_menu::SideMenu;
