//! Two scripted poets trading verse through single-slot JSON mailboxes.
//!
//! The crate provides:
//! - `PoetryAgent`, which writes haiku (or a fallback verse) from a prompt
//!   and turns a received poem into the next prompt.
//! - A `Mailbox` trait with a file-backed implementation that keeps one
//!   `message_to_<agent>.json` per recipient.
//! - `Exchange`, which runs the alternating conversation and prints a transcript.
//! - `WeatherClient`, an unrelated lookup that shells out to `curl`.

mod agent;
mod composer;
mod config;
mod error;
mod message;
mod storage;
mod style;
mod syllables;
mod telemetry;
mod text;
mod weather;
mod workflow;

pub use agent::PoetryAgent;
pub use composer::{capitalize, ComposedLine, HaikuComposer, Persona, DEFAULT_MAX_LINE_ATTEMPTS};
pub use config::{
    AppConfig, ComposerConfig, ExchangeConfig, LoggingConfig, MailboxConfig, WeatherConfig,
    CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE,
};
pub use error::{PoetError, Result};
pub use message::{utc_timestamp, Message, Payload, PromptData, PromptInput};
pub use storage::{validate_agent_name, FileMailbox, InMemoryMailbox, Mailbox};
pub use style::{FormKind, FormRules, StyleGuide, HAIKU_FORM_NAME};
pub use syllables::SyllableCounter;
pub use telemetry::init_tracing;
pub use text::{prompt_keywords, reference_phrase, significant_words, theme_keywords, Themes};
pub use weather::{is_program_available, WeatherClient, WeatherOutcome};
pub use workflow::{
    message_type_for, poem_title, print_poem, Exchange, ExchangeReport, ExchangeSettings,
    PoemRecord,
};
