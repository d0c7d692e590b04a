use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::composer::{Persona, DEFAULT_MAX_LINE_ATTEMPTS};
use crate::error::{PoetError, Result};
use crate::style::{FormRules, StyleGuide};

pub const CONFIG_PATH_ENV: &str = "POET_RELAY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "poet-relay.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeConfig {
    #[serde(default = "default_opener")]
    pub opener: String,
    #[serde(default = "default_responder")]
    pub responder: String,
    #[serde(default = "default_initial_prompt")]
    pub initial_prompt: String,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            opener: default_opener(),
            responder: default_responder(),
            initial_prompt: default_initial_prompt(),
            rounds: default_rounds(),
            step_delay_ms: default_step_delay_ms(),
            transcript_path: None,
        }
    }
}

fn default_opener() -> String {
    "alpha".into()
}

fn default_responder() -> String {
    "beta".into()
}

fn default_initial_prompt() -> String {
    "the dawn of creativity".into()
}

fn default_rounds() -> usize {
    2
}

fn default_step_delay_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailboxConfig {
    #[serde(default = "default_mailbox_dir")]
    pub directory: PathBuf,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            directory: default_mailbox_dir(),
        }
    }
}

fn default_mailbox_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComposerConfig {
    #[serde(default)]
    pub form: FormRules,
    #[serde(default = "default_max_line_attempts")]
    pub max_line_attempts: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub pronunciation_dictionary: Option<PathBuf>,
    #[serde(default)]
    pub opener_persona: Option<Persona>,
    #[serde(default)]
    pub responder_persona: Option<Persona>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            form: FormRules::default(),
            max_line_attempts: default_max_line_attempts(),
            seed: None,
            pronunciation_dictionary: None,
            opener_persona: None,
            responder_persona: None,
        }
    }
}

fn default_max_line_attempts() -> usize {
    DEFAULT_MAX_LINE_ATTEMPTS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_http_client")]
    pub http_client: String,
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            http_client: default_http_client(),
            timeout_secs: default_weather_timeout(),
        }
    }
}

fn default_weather_url() -> String {
    "wttr.in".into()
}

fn default_http_client() -> String {
    "curl".into()
}

fn default_weather_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub mailbox: MailboxConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
    #[serde(default)]
    pub style: StyleGuide,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            PoetError::Config(format!("failed reading `{}`: {err}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|err| PoetError::Config(format!("failed to parse configuration: {err}")))
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// File named by `POET_RELAY_CONFIG`, else `poet-relay.toml` when it
    /// exists, else defaults; environment overrides apply in every case.
    pub fn load() -> Result<Self> {
        let explicit = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut cfg = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = env::var("POET_RELAY_MAILBOX_DIR") {
            self.mailbox.directory = PathBuf::from(dir);
        }
        if let Ok(prompt) = env::var("POET_RELAY_INITIAL_PROMPT") {
            self.exchange.initial_prompt = prompt;
        }
        if let Ok(rounds) = env::var("POET_RELAY_ROUNDS") {
            self.exchange.rounds = parse_env("POET_RELAY_ROUNDS", &rounds)?;
        }
        if let Ok(delay) = env::var("POET_RELAY_STEP_DELAY_MS") {
            self.exchange.step_delay_ms = parse_env("POET_RELAY_STEP_DELAY_MS", &delay)?;
        }
        if let Ok(path) = env::var("POET_RELAY_TRANSCRIPT") {
            self.exchange.transcript_path = Some(PathBuf::from(path));
        }
        if let Ok(seed) = env::var("POET_RELAY_SEED") {
            self.composer.seed = Some(parse_env("POET_RELAY_SEED", &seed)?);
        }
        if let Ok(level) = env::var("POET_RELAY_LOG") {
            self.logging.level = level;
        }
        if let Ok(url) = env::var("POET_RELAY_WEATHER_URL") {
            self.weather.base_url = url;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| PoetError::Config(format!("invalid `{key}` value `{value}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FormKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.exchange.rounds, 2);
        assert_eq!(cfg.composer.form.kind, FormKind::Haiku);
        assert_eq!(cfg.composer.max_line_attempts, 30);
        assert_eq!(cfg.weather.base_url, "wttr.in");
    }

    #[test]
    fn loads_sections_and_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[exchange]\ninitial_prompt='moss on old stone'\nrounds=3\n[composer]\nseed=9\nopener_persona='beta'\n[composer.form]\nname='Tercet'\nkind='free'\nline_count=3\n[style]\noverall_tone=['wry']"
        )
        .unwrap();

        env::set_var("POET_RELAY_STEP_DELAY_MS", "0");
        let cfg = AppConfig::from_env_or_file(file.path()).unwrap();
        env::remove_var("POET_RELAY_STEP_DELAY_MS");

        assert_eq!(cfg.exchange.initial_prompt, "moss on old stone");
        assert_eq!(cfg.exchange.rounds, 3);
        assert_eq!(cfg.exchange.step_delay_ms, 0);
        assert_eq!(cfg.composer.seed, Some(9));
        assert_eq!(cfg.composer.opener_persona, Some(Persona::Beta));
        assert_eq!(cfg.composer.form.kind, FormKind::Free);
        assert_eq!(cfg.style.leading_tone(), "wry");
        assert_eq!(cfg.style.genre_preference, "narrative_epic");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = AppConfig::from_toml("[exchange\nrounds=").unwrap_err();
        assert!(matches!(err, PoetError::Config(_)));
    }

    #[test]
    fn unparsable_override_is_rejected() {
        let err = parse_env::<u64>("POET_RELAY_SEED", "many").unwrap_err();
        assert!(err.to_string().contains("POET_RELAY_SEED"));
    }
}
