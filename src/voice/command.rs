use super::{RecognitionConfig, RecognitionEvent, SpeechRecognizer, Utterance};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

pub const LANG_PLACEHOLDER: &str = "{lang}";
pub const LANG_ENV_VAR: &str = "HEALTHMATE_SPEECH_LANG";

/// Speech capability backed by an external speech-to-text program that
/// records one utterance and prints its transcript on stdout.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    limit: Duration,
    runtime: Handle,
}

impl CommandRecognizer {
    pub fn new(command: &[String], limit: Duration, runtime: Handle) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            limit,
            runtime,
        })
    }

    fn command_for(&self, config: &RecognitionConfig) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(
                self.args
                    .iter()
                    .map(|arg| arg.replace(LANG_PLACEHOLDER, &config.lang)),
            )
            .env(LANG_ENV_VAR, &config.lang)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&self, config: RecognitionConfig) -> mpsc::UnboundedReceiver<RecognitionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut command = self.command_for(&config);
        let program = self.program.clone();
        let limit = self.limit;

        self.runtime.spawn(async move {
            tracing::debug!("starting speech command {program} for {}", config.lang);
            let event = match tokio::time::timeout(limit, command.output()).await {
                Ok(Ok(output)) if output.status.success() => {
                    outcome_from_stdout(&String::from_utf8_lossy(&output.stdout))
                }
                Ok(Ok(output)) => RecognitionEvent::Error {
                    code: error_code_from_stderr(&String::from_utf8_lossy(&output.stderr)),
                },
                Ok(Err(err)) => RecognitionEvent::Error {
                    code: error_code_from_spawn(&err).to_string(),
                },
                // dropping the output future kills the child
                Err(_) => {
                    tracing::warn!(?limit, "speech command {program} timed out");
                    RecognitionEvent::Error {
                        code: "aborted".to_string(),
                    }
                }
            };
            let _ = tx.send(event);
            let _ = tx.send(RecognitionEvent::End);
        });

        rx
    }
}

fn outcome_from_stdout(stdout: &str) -> RecognitionEvent {
    match stdout.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(transcript) => RecognitionEvent::Result {
            utterances: vec![Utterance {
                alternatives: vec![transcript.to_string()],
            }],
        },
        None => RecognitionEvent::Error {
            code: "no-speech".to_string(),
        },
    }
}

fn error_code_from_stderr(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("aborted")
        .to_string()
}

fn error_code_from_spawn(err: &io::Error) -> &'static str {
    match err.kind() {
        io::ErrorKind::PermissionDenied => "not-allowed",
        _ => "audio-capture",
    }
}

#[cfg(test)]
mod tests {
    use super::{error_code_from_stderr, outcome_from_stdout, CommandRecognizer};
    use crate::voice::{RecognitionConfig, RecognitionEvent, SpeechRecognizer, Utterance};
    use std::time::Duration;
    use tokio::runtime::Handle;

    const LIMIT: Duration = Duration::from_secs(30);

    fn shell(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    async fn collect(recognizer: &CommandRecognizer, language: &str) -> Vec<RecognitionEvent> {
        let mut rx = recognizer.start(RecognitionConfig::for_language(language));
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn empty_command_is_not_a_capability() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime should build");
        assert!(CommandRecognizer::new(&[], LIMIT, runtime.handle().clone()).is_none());
        assert!(
            CommandRecognizer::new(&[" ".to_string()], LIMIT, runtime.handle().clone()).is_none()
        );
    }

    #[test]
    fn stdout_first_non_empty_line_is_the_transcript() {
        assert_eq!(
            outcome_from_stdout("\n  Sleep better \nnoise\n"),
            RecognitionEvent::Result {
                utterances: vec![Utterance {
                    alternatives: vec!["Sleep better".to_string()],
                }],
            }
        );
        assert_eq!(
            outcome_from_stdout("   \n"),
            RecognitionEvent::Error {
                code: "no-speech".to_string()
            }
        );
    }

    #[test]
    fn stderr_last_line_is_the_error_code() {
        assert_eq!(error_code_from_stderr("warming up\nnot-allowed\n"), "not-allowed");
        assert_eq!(error_code_from_stderr(""), "aborted");
    }

    #[tokio::test]
    async fn successful_command_yields_result_then_end() {
        let recognizer =
            CommandRecognizer::new(&shell("echo 'Sleep better'"), LIMIT, Handle::current())
                .expect("command should be accepted");
        let events = collect(&recognizer, "english").await;
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Result {
                    utterances: vec![Utterance {
                        alternatives: vec!["Sleep better".to_string()],
                    }],
                },
                RecognitionEvent::End,
            ]
        );
    }

    #[tokio::test]
    async fn locale_is_substituted_and_exported() {
        let recognizer = CommandRecognizer::new(
            &[
                "sh".to_string(),
                "-c".to_string(),
                "echo \"$1 $HEALTHMATE_SPEECH_LANG\"".to_string(),
                "speech".to_string(),
                "{lang}".to_string(),
            ],
            LIMIT,
            Handle::current(),
        )
        .expect("command should be accepted");
        let events = collect(&recognizer, "hindi").await;
        assert_eq!(
            events.first(),
            Some(&RecognitionEvent::Result {
                utterances: vec![Utterance {
                    alternatives: vec!["hi-IN hi-IN".to_string()],
                }],
            })
        );
    }

    #[tokio::test]
    async fn failing_command_reports_stderr_code() {
        let recognizer = CommandRecognizer::new(
            &shell("echo not-allowed >&2; exit 1"),
            LIMIT,
            Handle::current(),
        )
        .expect("command should be accepted");
        let events = collect(&recognizer, "english").await;
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Error {
                    code: "not-allowed".to_string()
                },
                RecognitionEvent::End,
            ]
        );
    }

    #[tokio::test]
    async fn missing_program_reports_audio_capture() {
        let recognizer = CommandRecognizer::new(
            &["healthmate-no-such-speech-program".to_string()],
            LIMIT,
            Handle::current(),
        )
        .expect("command should be accepted");
        let events = collect(&recognizer, "english").await;
        assert_eq!(
            events.first(),
            Some(&RecognitionEvent::Error {
                code: "audio-capture".to_string()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn hung_command_is_aborted_after_the_limit() {
        let recognizer = CommandRecognizer::new(
            &shell("sleep 100000"),
            Duration::from_secs(5),
            Handle::current(),
        )
        .expect("command should be accepted");
        let started = tokio::time::Instant::now();
        let events = collect(&recognizer, "english").await;
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Error {
                    code: "aborted".to_string()
                },
                RecognitionEvent::End,
            ]
        );
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
