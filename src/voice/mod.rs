use tokio::sync::mpsc;

pub mod command;

pub use command::CommandRecognizer;

pub const HINDI_LANGUAGE: &str = "hindi";
pub const HINDI_LOCALE: &str = "hi-IN";
pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub lang: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl RecognitionConfig {
    pub fn for_language(language: &str) -> Self {
        let lang = if language == HINDI_LANGUAGE {
            HINDI_LOCALE
        } else {
            DEFAULT_LOCALE
        };
        Self {
            lang: lang.to_string(),
            continuous: false,
            interim_results: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result { utterances: Vec<Utterance> },
    Error { code: String },
    End,
}

impl RecognitionEvent {
    pub fn top_transcript(utterances: &[Utterance]) -> Option<&str> {
        utterances
            .first()
            .and_then(|utterance| utterance.alternatives.first())
            .map(String::as_str)
    }
}

pub trait SpeechRecognizer: Send + Sync {
    fn start(&self, config: RecognitionConfig) -> mpsc::UnboundedReceiver<RecognitionEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    VoiceUnsupported,
    NoSpeech,
    MicrophoneDenied,
    VoiceFailed,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Self::VoiceUnsupported => {
                "Voice recognition is not supported on this system. Configure a speech command to enable it."
            }
            Self::NoSpeech => "No speech detected. Please try again.",
            Self::MicrophoneDenied => {
                "Microphone access denied. Please allow microphone access in your system settings."
            }
            Self::VoiceFailed => "Voice recognition error. Please try again.",
        }
    }

    pub fn from_error_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "not-allowed" => Self::MicrophoneDenied,
            _ => Self::VoiceFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening {
        session: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    Transcript(String),
    Notice(Notice),
    Settled,
    Ignored,
}

/// Idle/Listening state machine around one capture session at a time.
#[derive(Debug, Default)]
pub struct VoiceBridge {
    state: VoiceState,
    next_session: u64,
}

impl VoiceBridge {
    #[cfg(test)]
    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, VoiceState::Listening { .. })
    }

    pub fn begin(&mut self) -> Option<u64> {
        if self.is_listening() {
            return None;
        }
        self.next_session += 1;
        let session = self.next_session;
        self.state = VoiceState::Listening { session };
        Some(session)
    }

    pub fn handle(&mut self, session: u64, event: RecognitionEvent) -> VoiceOutcome {
        let active = self.state == VoiceState::Listening { session };
        match event {
            RecognitionEvent::End => {
                if active {
                    self.state = VoiceState::Idle;
                }
                VoiceOutcome::Settled
            }
            _ if !active => VoiceOutcome::Ignored,
            RecognitionEvent::Result { utterances } => {
                self.state = VoiceState::Idle;
                match RecognitionEvent::top_transcript(&utterances) {
                    Some(transcript) => VoiceOutcome::Transcript(transcript.to_string()),
                    None => VoiceOutcome::Settled,
                }
            }
            RecognitionEvent::Error { code } => {
                self.state = VoiceState::Idle;
                tracing::warn!("speech recognition error: {code}");
                VoiceOutcome::Notice(Notice::from_error_code(&code))
            }
        }
    }
}
