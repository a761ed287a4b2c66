use anyhow::{Context, Result};
use nyaya::config::AppConfig;
use nyaya::conversation::ChatPipeline;
use nyaya::llm::GeminiClient;
use nyaya::speech::{default_recognizer, default_synthesizer};
use nyaya::ui::{AppState, Dialog, NyayaApp, Theme};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nyaya=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Nyaya Legal AI");

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!("Using model {} at {}", config.llm.model, config.llm.base_url);

    let client = GeminiClient::new(config.llm.clone()).context("Failed to create AI client")?;
    let pipeline = ChatPipeline::new(Arc::new(client));

    let mut state = AppState::new()
        .with_style(config.ui.default_style)
        .with_synthesizer(default_synthesizer(&config.speech))
        .with_recognizer(default_recognizer(&config.recognition))
        .with_pipeline(pipeline)
        .context("Failed to start chat worker")?;
    if config.ui.show_privacy_on_start {
        state.open_dialog(Dialog::Privacy);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Nyaya Legal AI")
            .with_inner_size([config.ui.window_width, config.ui.window_height])
            .with_min_inner_size([420.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Nyaya Legal AI",
        options,
        Box::new(|cc| Ok(Box::new(NyayaApp::new(cc, state, Theme::default())))),
    )
    .map_err(|e| anyhow::anyhow!("Window error: {}", e))
}
