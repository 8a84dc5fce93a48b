use crate::voice::RecognitionEvent;
use eframe::egui;
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ReplyReady(String),
    ReplyFailed(String),
    Voice {
        session: u64,
        event: RecognitionEvent,
    },
    OnboardingDue,
    WelcomeHidden,
    ScrollSettled,
}

#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<AppEvent>,
    repaint: Arc<OnceLock<egui::Context>>,
    runtime: Handle,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<AppEvent>, runtime: Handle) -> Self {
        Self {
            tx,
            repaint: Arc::new(OnceLock::new()),
            runtime,
        }
    }

    pub fn attach_repaint(&self, ctx: egui::Context) {
        if self.repaint.set(ctx).is_err() {
            tracing::debug!("repaint context already attached");
        }
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn emit(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event channel closed; dropping event");
            return;
        }
        if let Some(ctx) = self.repaint.get() {
            ctx.request_repaint();
        }
    }

    /// Posts `event` once `delay` has elapsed on the runtime clock.
    pub fn emit_after(&self, delay: Duration, event: AppEvent) {
        let sink = self.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            sink.emit(event);
        });
    }
}
