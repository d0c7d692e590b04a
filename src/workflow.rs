//! The alternating poem exchange between two agents.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::agent::PoetryAgent;
use crate::composer::{capitalize, HaikuComposer, Persona};
use crate::config::AppConfig;
use crate::error::Result;
use crate::message::Message;
use crate::storage::{validate_agent_name, FileMailbox, Mailbox};
use crate::style::FormRules;
use crate::syllables::SyllableCounter;

const ORDINALS: &[&str] = &[
    "First", "Second", "Third", "Fourth", "Fifth", "Sixth", "Seventh", "Eighth", "Ninth", "Tenth",
];

/// Message type carried by the `index`-th message of an exchange.
pub fn message_type_for(index: usize) -> String {
    match index {
        0 => "initial_poem".into(),
        1 => "response_poem".into(),
        2 => "second_poem".into(),
        n => format!("poem_{}", n + 1),
    }
}

fn ordinal(n: usize) -> String {
    ORDINALS
        .get(n.saturating_sub(1))
        .map(|word| word.to_string())
        .unwrap_or_else(|| format!("#{n}"))
}

/// Header title for poem `index` out of `total`, written by the opener when
/// `index` is even.
pub fn poem_title(index: usize, total: usize, peer: &str) -> String {
    let kind = if index % 2 == 0 { "Poem" } else { "Response Poem" };
    let suffix = if index + 1 == total && total > 1 {
        "(Final)".to_string()
    } else {
        format!("(to {})", capitalize(peer))
    };
    format!("{} {kind} {suffix}", ordinal(index / 2 + 1))
}

/// Print a poem with a header, indented lines and a dashed footer.
pub fn print_poem<W: Write>(out: &mut W, agent: &str, title: &str, poem: &str) -> std::io::Result<()> {
    writeln!(out, "\n--- {agent}'s {title} ---")?;
    for line in poem.split('\n') {
        writeln!(out, "  {line}")?;
    }
    writeln!(out, "-----------------------------------")
}

fn print_received<W: Write>(out: &mut W, receiver: &str, message: &Message) -> std::io::Result<()> {
    writeln!(out, "\n{receiver} received a message:")?;
    writeln!(out, "--------------------------")?;
    writeln!(out, "From: {}", message.sender_id)?;
    writeln!(out, "Type: {}", message.message_type)?;
    writeln!(out, "Payload (from {}):", capitalize(&message.sender_id))?;
    writeln!(out, "{}", message.payload.readable_text())?;
    writeln!(out, "--------------------------")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoemRecord {
    pub agent: String,
    pub title: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExchangeReport {
    pub poems: Vec<PoemRecord>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_reason: Option<String>,
}

impl ExchangeReport {
    pub async fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path.as_ref(), body).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub initial_prompt: String,
    pub rounds: usize,
    pub step_delay: Duration,
    pub form: FormRules,
    pub transcript_path: Option<std::path::PathBuf>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            initial_prompt: "the dawn of creativity".into(),
            rounds: 2,
            step_delay: Duration::from_millis(100),
            form: FormRules::haiku(),
            transcript_path: None,
        }
    }
}

/// Two poets taking turns through a shared mailbox.
pub struct Exchange {
    opener: PoetryAgent,
    responder: PoetryAgent,
    mailbox: Arc<dyn Mailbox>,
    settings: ExchangeSettings,
}

impl Exchange {
    pub fn new(opener: PoetryAgent, responder: PoetryAgent, mailbox: Arc<dyn Mailbox>) -> Self {
        Self {
            opener,
            responder,
            mailbox,
            settings: ExchangeSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ExchangeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wire agents, composer and file mailbox from configuration.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        validate_agent_name(&cfg.exchange.opener)?;
        validate_agent_name(&cfg.exchange.responder)?;
        let counter = match &cfg.composer.pronunciation_dictionary {
            Some(path) => SyllableCounter::from_cmu_file(path)?,
            None => SyllableCounter::heuristic(),
        };
        let build = |name: &str, persona: Option<Persona>, seed: Option<u64>| {
            let persona = persona.unwrap_or_else(|| Persona::for_agent_name(name));
            let composer = HaikuComposer::new(persona, counter.clone())
                .with_max_attempts(cfg.composer.max_line_attempts);
            let agent = PoetryAgent::new(name)
                .with_composer(composer)
                .with_style(cfg.style.clone());
            match seed {
                Some(seed) => agent.with_seed(seed),
                None => agent,
            }
        };

        let opener = build(
            &cfg.exchange.opener,
            cfg.composer.opener_persona,
            cfg.composer.seed,
        );
        let responder = build(
            &cfg.exchange.responder,
            cfg.composer.responder_persona,
            cfg.composer.seed.map(|seed| seed.wrapping_add(1)),
        );
        let mailbox: Arc<dyn Mailbox> = Arc::new(FileMailbox::new(&cfg.mailbox.directory));

        Ok(Self::new(opener, responder, mailbox).with_settings(ExchangeSettings {
            initial_prompt: cfg.exchange.initial_prompt.clone(),
            rounds: cfg.exchange.rounds,
            step_delay: Duration::from_millis(cfg.exchange.step_delay_ms),
            form: cfg.composer.form.clone(),
            transcript_path: cfg.exchange.transcript_path.clone(),
        }))
    }

    pub fn opener(&self) -> &PoetryAgent {
        &self.opener
    }

    pub fn responder(&self) -> &PoetryAgent {
        &self.responder
    }

    async fn pause(&self) {
        if !self.settings.step_delay.is_zero() {
            sleep(self.settings.step_delay).await;
        }
    }

    async fn clear_stale_slots<W: Write>(&self, out: &mut W) -> Result<()> {
        for name in [self.opener.name(), self.responder.name()] {
            match self.mailbox.clear(name).await {
                Ok(true) => writeln!(out, "Cleaned up old message file for {name}")?,
                Ok(false) => {}
                Err(err) => {
                    warn!(agent = name, error = %err, "mailbox cleanup failed");
                    writeln!(out, "Error during cleanup: {err}")?;
                }
            }
        }
        Ok(())
    }

    /// Run the whole exchange, writing the transcript to `out`.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> Result<ExchangeReport> {
        let total = self.settings.rounds.max(1) * 2;
        let form = self.settings.form.clone();
        let mailbox = Arc::clone(&self.mailbox);

        writeln!(out, "Initializing Agents...")?;
        writeln!(out, "Agent {}: {}", capitalize(self.opener.name()), self.opener.name())?;
        writeln!(out, "Agent {}: {}", capitalize(self.responder.name()), self.responder.name())?;
        self.clear_stale_slots(out).await?;
        writeln!(out, "\n--- [BEGIN WORKFLOW] ---")?;

        let mut report = ExchangeReport {
            poems: Vec::with_capacity(total),
            completed: false,
            stopped_reason: None,
        };

        let opener_name = self.opener.name().to_string();
        let responder_name = self.responder.name().to_string();
        let initial_prompt = self.settings.initial_prompt.clone();

        writeln!(out, "\n--- {}'s First Turn ---", capitalize(&opener_name))?;
        writeln!(out, "{}'s initial prompt for first poem: '{initial_prompt}'", capitalize(&opener_name))?;
        let poem = self.opener.generate_poetry(initial_prompt.as_str(), &form);
        let title = poem_title(0, total, &responder_name);
        print_poem(out, &opener_name, &title, &poem)?;
        report.poems.push(PoemRecord {
            agent: opener_name.clone(),
            title,
            prompt: initial_prompt,
            reference: None,
            text: poem.clone(),
        });

        writeln!(out, "\n{opener_name} sending its poem to {responder_name}...")?;
        self.opener
            .send_message(mailbox.as_ref(), &responder_name, &message_type_for(0), poem)
            .await?;
        self.pause().await;

        for index in 1..total {
            let (receiver, peer_name) = if index % 2 == 1 {
                (&mut self.responder, opener_name.as_str())
            } else {
                (&mut self.opener, responder_name.as_str())
            };
            let receiver_name = receiver.name().to_string();
            let expected = message_type_for(index - 1);

            writeln!(
                out,
                "\n--- {}'s {} Turn ---",
                capitalize(&receiver_name),
                ordinal(index / 2 + 1)
            )?;
            writeln!(out, "{receiver_name} attempting to receive message...")?;

            let Some(message) = receiver.receive_message(mailbox.as_ref()).await? else {
                writeln!(out, "{receiver_name} received no message.")?;
                report.stopped_reason = Some(format!("{receiver_name} received no message"));
                break;
            };
            print_received(out, &capitalize(&receiver_name), &message)?;

            if message.message_type != expected {
                writeln!(
                    out,
                    "{receiver_name} received unexpected message type: {}",
                    message.message_type
                )?;
                report.stopped_reason = Some(format!(
                    "{receiver_name} expected `{expected}` but got `{}`",
                    message.message_type
                ));
                break;
            }

            writeln!(
                out,
                "\n{receiver_name} interpreting {}'s poem to derive a new prompt...",
                capitalize(&message.sender_id)
            )?;
            let prompt = receiver.interpret_poetry(message.payload.readable_text());
            writeln!(
                out,
                "\n{receiver_name} generating a poem based on prompt: '{}'...",
                prompt.prompt
            )?;
            let poem = receiver.generate_poetry(prompt.clone(), &form);
            let title = poem_title(index, total, peer_name);
            print_poem(out, &receiver_name, &title, &poem)?;
            report.poems.push(PoemRecord {
                agent: receiver_name.clone(),
                title,
                prompt: prompt.prompt,
                reference: prompt.reference,
                text: poem.clone(),
            });

            if index + 1 < total {
                writeln!(out, "\n{receiver_name} sending its poem to {peer_name}...")?;
                receiver
                    .send_message(mailbox.as_ref(), peer_name, &message_type_for(index), poem)
                    .await?;
                self.pause().await;
            }
        }

        report.completed = report.poems.len() == total;
        writeln!(out, "\n--- [END WORKFLOW] ---")?;
        info!(
            poems = report.poems.len(),
            completed = report.completed,
            "exchange finished"
        );

        if let Some(path) = &self.settings.transcript_path {
            report.export(path).await?;
            writeln!(out, "Exchange saved to {}", path.display())?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoetError;
    use crate::storage::InMemoryMailbox;

    fn quiet_settings(rounds: usize) -> ExchangeSettings {
        ExchangeSettings {
            rounds,
            step_delay: Duration::ZERO,
            ..ExchangeSettings::default()
        }
    }

    #[test]
    fn message_types_follow_exchange_order() {
        assert_eq!(message_type_for(0), "initial_poem");
        assert_eq!(message_type_for(1), "response_poem");
        assert_eq!(message_type_for(2), "second_poem");
        assert_eq!(message_type_for(3), "poem_4");
    }

    #[test]
    fn titles_match_two_round_exchange() {
        assert_eq!(poem_title(0, 4, "beta"), "First Poem (to Beta)");
        assert_eq!(poem_title(1, 4, "alpha"), "First Response Poem (to Alpha)");
        assert_eq!(poem_title(2, 4, "beta"), "Second Poem (to Beta)");
        assert_eq!(poem_title(3, 4, "alpha"), "Second Response Poem (Final)");
        assert_eq!(poem_title(22, 24, "beta"), "#12 Poem (to Beta)");
    }

    #[test]
    fn poem_block_is_indented() {
        let mut out = Vec::new();
        print_poem(&mut out, "alpha", "First Poem (to Beta)", "One.\nTwo.").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\n--- alpha's First Poem (to Beta) ---\n  One.\n  Two.\n-----------------------------------\n"
        );
    }

    #[tokio::test]
    async fn two_rounds_produce_four_poems_and_drain_mailbox() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let mut exchange = Exchange::new(
            PoetryAgent::new("alpha").with_seed(1),
            PoetryAgent::new("beta").with_seed(2),
            mailbox.clone(),
        )
        .with_settings(quiet_settings(2));

        let mut out = Vec::new();
        let report = exchange.run(&mut out).await.unwrap();

        assert!(report.completed);
        let agents: Vec<&str> = report.poems.iter().map(|p| p.agent.as_str()).collect();
        assert_eq!(agents, vec!["alpha", "beta", "alpha", "beta"]);
        assert_eq!(report.poems[0].prompt, "the dawn of creativity");
        assert!(report.poems[1].reference.is_some());
        assert!(!mailbox.pending("alpha").unwrap());
        assert!(!mailbox.pending("beta").unwrap());

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("--- [BEGIN WORKFLOW] ---"));
        assert!(transcript.contains("Type: second_poem"));
        assert!(transcript.contains("Second Response Poem (Final)"));
        assert!(transcript.trim_end().ends_with("--- [END WORKFLOW] ---"));
    }

    #[test]
    fn config_rejects_agent_names_that_escape_mailbox_directory() {
        let mut cfg = AppConfig::default();
        cfg.exchange.responder = "../x".into();
        let err = Exchange::from_config(&cfg).err().unwrap();
        assert!(matches!(err, PoetError::Config(_)));
    }

    #[tokio::test]
    async fn stale_slots_are_cleared_before_starting() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox
            .deliver(&Message::new("ghost", "alpha", "response_poem", "old"))
            .await
            .unwrap();

        let mut exchange = Exchange::new(
            PoetryAgent::new("alpha").with_seed(3),
            PoetryAgent::new("beta").with_seed(4),
            mailbox.clone(),
        )
        .with_settings(quiet_settings(1));

        let mut out = Vec::new();
        let report = exchange.run(&mut out).await.unwrap();
        let transcript = String::from_utf8(out).unwrap();

        assert!(transcript.contains("Cleaned up old message file for alpha"));
        assert!(report.completed);
        assert_eq!(report.poems.len(), 2);
    }

    #[tokio::test]
    async fn unexpected_message_type_stops_the_exchange() {
        struct Tamperer;

        #[async_trait::async_trait]
        impl Mailbox for Tamperer {
            async fn deliver(&self, _message: &Message) -> Result<()> {
                Ok(())
            }

            async fn collect(&self, agent: &str) -> Result<Option<Message>> {
                Ok(Some(Message::new("mallory", agent, "critique", "no")))
            }

            async fn clear(&self, _agent: &str) -> Result<bool> {
                Ok(false)
            }
        }

        let mut exchange = Exchange::new(
            PoetryAgent::new("alpha").with_seed(5),
            PoetryAgent::new("beta").with_seed(6),
            Arc::new(Tamperer),
        )
        .with_settings(quiet_settings(2));

        let mut out = Vec::new();
        let report = exchange.run(&mut out).await.unwrap();

        assert!(!report.completed);
        assert_eq!(report.poems.len(), 1);
        assert!(report
            .stopped_reason
            .as_deref()
            .unwrap()
            .contains("`initial_poem` but got `critique`"));
    }
}
