use figment::{
    providers::{Env, Format, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "HEALTHMATE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "healthmate.json";
pub const ENV_PREFIX: &str = "HEALTHMATE_";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/message";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_suggestions")]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default = "default_composer_max_rows")]
    pub composer_max_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            timings: Timings::default(),
            languages: default_languages(),
            suggestions: default_suggestions(),
            voice: VoiceConfig::default(),
            composer_max_rows: default_composer_max_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub endpoint: String,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub reply_delay_ms: u64,
    pub onboarding_delay_ms: u64,
    pub welcome_fade_ms: u64,
    pub scroll_settle_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            reply_delay_ms: 800,
            onboarding_delay_ms: 500,
            welcome_fade_ms: 300,
            scroll_settle_ms: 100,
        }
    }
}

impl Timings {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn onboarding_delay(&self) -> Duration {
        Duration::from_millis(self.onboarding_delay_ms)
    }

    pub fn welcome_fade(&self) -> Duration {
        Duration::from_millis(self.welcome_fade_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Speech-to-text program and arguments; `{lang}` is replaced with the locale.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default = "default_voice_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_ms: default_voice_timeout_ms(),
        }
    }
}

impl VoiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to load configuration from {path:?} on `{stage}`: {source}"))]
    Extract {
        stage: &'static str,
        path: PathBuf,
        #[snafu(source(from(figment::Error, Box::new)))]
        source: Box<figment::Error>,
    },
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if path.exists() {
            figment = figment.merge(Json::file(path));
        } else {
            tracing::info!("config file not found at {:?}, using defaults", path);
        }
        let figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"));

        let config: AppConfig = figment.extract().context(ExtractSnafu {
            stage: "extract-config",
            path: path.to_path_buf(),
        })?;
        Ok(config.normalized())
    }

    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        match Self::load(&path) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!("{error}. using defaults");
                Self::default()
            }
        }
    }

    fn normalized(mut self) -> Self {
        self.languages.retain(|language| !language.trim().is_empty());
        if self.languages.is_empty() {
            self.languages = default_languages();
        }
        self.suggestions
            .retain(|suggestion| !suggestion.trim().is_empty());
        self.composer_max_rows = self.composer_max_rows.max(1);
        if let Some(command) = &self.voice.command {
            if command.first().map_or(true, |program| program.trim().is_empty()) {
                self.voice.command = None;
            }
        }
        if self.voice.timeout_ms == 0 {
            self.voice.timeout_ms = default_voice_timeout_ms();
        }
        self
    }
}

fn default_languages() -> Vec<String> {
    vec!["english".to_string(), "hindi".to_string()]
}

fn default_suggestions() -> Vec<String> {
    [
        "What to do for fever?",
        "Healthy diet tips",
        "Exercise recommendations",
        "Stress management",
        "Child vaccination schedule",
        "Sleep better",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_composer_max_rows() -> usize {
    5
}

fn default_voice_timeout_ms() -> u64 {
    30_000
}
