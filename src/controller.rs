use crate::backend::{send_with_timeout, ChatBackend, MessageRequest, APOLOGY};
use crate::chat::{Sender, Transcript};
use crate::config::Timings;
use crate::event::{AppEvent, EventSink};
use crate::voice::{
    Notice, RecognitionConfig, RecognitionEvent, SpeechRecognizer, VoiceBridge, VoiceOutcome,
};
use chrono::Local;
use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

pub const GREETING: &str = "Hello! 👋 I'm your HealthMate assistant. I can help you with health information, symptoms, nutrition, exercise, and more. How can I assist you today?";
pub const GREETING_TIP: &str =
    "💡 Try asking me about symptoms, nutrition, exercise, or vaccinations!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WelcomePanel {
    #[default]
    Visible,
    Dismissing,
    Hidden,
}

pub struct ChatController {
    transcript: Transcript,
    busy: bool,
    typing: bool,
    input: String,
    welcome: WelcomePanel,
    onboarding_scheduled: bool,
    voice: VoiceBridge,
    notices: VecDeque<Notice>,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
    backend: Arc<dyn ChatBackend>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    timings: Timings,
    request_timeout: Duration,
    sink: EventSink,
    rx: Receiver<AppEvent>,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        timings: Timings,
        request_timeout: Duration,
        sink: EventSink,
        rx: Receiver<AppEvent>,
    ) -> Self {
        Self {
            transcript: Transcript::default(),
            busy: false,
            typing: false,
            input: String::new(),
            welcome: WelcomePanel::Visible,
            onboarding_scheduled: false,
            voice: VoiceBridge::default(),
            notices: VecDeque::new(),
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
            backend,
            recognizer,
            timings,
            request_timeout,
            sink,
            rx,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.busy
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn is_listening(&self) -> bool {
        self.voice.is_listening()
    }

    pub fn welcome(&self) -> WelcomePanel {
        self.welcome
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn choose_suggestion(&mut self, suggestion: &str) {
        self.input = suggestion.to_string();
    }

    pub fn current_notice(&self) -> Option<Notice> {
        self.notices.front().copied()
    }

    pub fn acknowledge_notice(&mut self) {
        self.notices.pop_front();
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics_log
    }

    pub fn attach_repaint(&self, ctx: eframe::egui::Context) {
        self.sink.attach_repaint(ctx);
    }

    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_bottom)
    }

    pub fn start(&mut self) {
        if self.onboarding_scheduled {
            return;
        }
        self.onboarding_scheduled = true;
        self.sink
            .emit_after(self.timings.onboarding_delay(), AppEvent::OnboardingDue);
    }

    pub fn send_staged(&mut self, language: &str) {
        let staged = self.input.clone();
        self.submit(&staged, language);
    }

    pub fn submit(&mut self, raw_text: &str, language: &str) {
        let text = raw_text.trim();
        if text.is_empty() {
            return;
        }
        if self.busy {
            tracing::debug!("submit ignored while awaiting a reply");
            return;
        }

        self.dismiss_welcome();
        self.transcript.push(Sender::User, text);
        self.input.clear();
        self.request_scroll();

        self.busy = true;
        self.typing = true;
        self.request_scroll();

        let request = MessageRequest {
            text: text.to_string(),
            language: language.to_string(),
        };
        let backend = Arc::clone(&self.backend);
        let sink = self.sink.clone();
        let limit = self.request_timeout;
        let reply_delay = self.timings.reply_delay();

        tracing::info!(
            language = %request.language,
            messages = self.transcript.len(),
            "sending message"
        );
        self.sink.runtime().spawn(async move {
            match send_with_timeout(backend.as_ref(), &request, limit).await {
                Ok(reply) => {
                    tokio::time::sleep(reply_delay).await;
                    sink.emit(AppEvent::ReplyReady(reply));
                }
                Err(err) => sink.emit(AppEvent::ReplyFailed(err.to_string())),
            }
        });
    }

    pub fn start_voice_capture(&mut self, language: &str) {
        let Some(recognizer) = self.recognizer.clone() else {
            self.notices.push_back(Notice::VoiceUnsupported);
            return;
        };
        let Some(session) = self.voice.begin() else {
            tracing::debug!("voice capture already listening");
            return;
        };

        let config = RecognitionConfig::for_language(language);
        tracing::debug!(session, lang = %config.lang, "voice capture started");
        let mut events = recognizer.start(config);
        let sink = self.sink.clone();
        self.sink.runtime().spawn(async move {
            let mut ended = false;
            while let Some(event) = events.recv().await {
                ended = event == RecognitionEvent::End;
                sink.emit(AppEvent::Voice { session, event });
                if ended {
                    break;
                }
            }
            if !ended {
                sink.emit(AppEvent::Voice {
                    session,
                    event: RecognitionEvent::End,
                });
            }
        });
    }

    pub fn pump(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ReplyReady(reply) => {
                self.typing = false;
                self.transcript.push(Sender::Bot, reply);
                self.busy = false;
                self.request_scroll();
            }
            AppEvent::ReplyFailed(reason) => {
                tracing::error!("message pipeline failed: {reason}");
                self.log_diagnostic(format!("send failed: {reason}"));
                self.typing = false;
                self.transcript.push(Sender::Bot, APOLOGY);
                self.busy = false;
                self.request_scroll();
            }
            AppEvent::Voice { session, event } => match self.voice.handle(session, event) {
                VoiceOutcome::Transcript(transcript) => self.input = transcript,
                VoiceOutcome::Notice(notice) => self.notices.push_back(notice),
                VoiceOutcome::Settled | VoiceOutcome::Ignored => {}
            },
            AppEvent::OnboardingDue => {
                self.transcript
                    .push(Sender::Bot, format!("{GREETING}\n\n{GREETING_TIP}"));
                self.request_scroll();
                self.dismiss_welcome();
            }
            AppEvent::WelcomeHidden => self.welcome = WelcomePanel::Hidden,
            AppEvent::ScrollSettled => self.scroll_to_bottom = true,
        }
    }

    fn dismiss_welcome(&mut self) {
        if self.welcome != WelcomePanel::Visible {
            return;
        }
        self.welcome = WelcomePanel::Dismissing;
        self.sink
            .emit_after(self.timings.welcome_fade(), AppEvent::WelcomeHidden);
    }

    fn request_scroll(&self) {
        self.sink
            .emit_after(self.timings.scroll_settle(), AppEvent::ScrollSettled);
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log.push(format!(
            "[{}] {}",
            Local::now().format("%H:%M:%S"),
            message.into()
        ));
    }
}
