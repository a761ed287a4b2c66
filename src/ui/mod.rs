//! Desktop user interface built on egui/eframe

pub mod app;
pub mod components;
pub mod state;
pub mod theme;

pub use app::NyayaApp;
pub use state::{AppState, Dialog, View};
pub use theme::Theme;
