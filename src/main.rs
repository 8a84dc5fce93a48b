mod app;
mod backend;
mod chat;
mod config;
mod controller;
mod event;
mod theme;
mod voice;

use app::HealthMateApp;
use backend::HttpBackend;
use config::AppConfig;
use controller::ChatController;
use eframe::egui;
use event::EventSink;
use std::sync::{mpsc, Arc};
use tracing_subscriber::EnvFilter;
use voice::{CommandRecognizer, SpeechRecognizer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("healthmate=info")),
        )
        .init();

    let config = AppConfig::load_or_default();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("healthmate-runtime")
        .build()?;

    let (tx, rx) = mpsc::channel();
    let sink = EventSink::new(tx, runtime.handle().clone());

    let backend = Arc::new(HttpBackend::new(config.backend.endpoint.clone()));
    tracing::info!(endpoint = %backend.endpoint(), "starting HealthMate");
    let recognizer = config
        .voice
        .command
        .as_deref()
        .and_then(|command| {
            CommandRecognizer::new(command, config.voice.timeout(), runtime.handle().clone())
        })
        .map(|recognizer| Arc::new(recognizer) as Arc<dyn SpeechRecognizer>);
    if recognizer.is_none() {
        tracing::info!("no speech command configured; voice input disabled");
    }

    let controller = ChatController::new(
        backend,
        recognizer,
        config.timings,
        config.backend.request_timeout(),
        sink,
        rx,
    );
    let mut app = HealthMateApp::new(controller, &config);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("HealthMate")
            .with_inner_size([480.0, 760.0])
            .with_min_inner_size([360.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "HealthMate",
        native_options,
        Box::new(move |creation_context| {
            app.install(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
