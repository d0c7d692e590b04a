use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::composer::{HaikuComposer, Persona};
use crate::error::Result;
use crate::message::{Message, Payload, PromptData, PromptInput};
use crate::storage::Mailbox;
use crate::style::{FormKind, FormRules, StyleGuide};
use crate::syllables::SyllableCounter;
use crate::text::{prompt_keywords, reference_phrase, theme_keywords};

const INTERPRETATION_TEMPLATES: usize = 4;

fn interpretation_prompt(index: usize, kw1: &str, kw2: &str) -> String {
    match index % INTERPRETATION_TEMPLATES {
        0 => format!("Delve into the connection between {kw1} and {kw2}."),
        1 => format!("Imagine {kw1} as a secret held by {kw2}\u{2014}what unfolds?"),
        2 => format!("A reflective dialogue: {kw1} converses with {kw2}."),
        _ => format!("Explore the hidden meaning of {kw1}'s journey towards {kw2}."),
    }
}

/// A scripted poet that writes from prompts and reads other poets' work.
pub struct PoetryAgent {
    name: String,
    style: StyleGuide,
    composer: HaikuComposer,
    rng: StdRng,
    last_prompt: Option<String>,
    generation_counter: u64,
}

impl PoetryAgent {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let persona = Persona::for_agent_name(&name);
        Self {
            name,
            style: StyleGuide::default(),
            composer: HaikuComposer::new(persona, SyllableCounter::heuristic()),
            rng: StdRng::from_entropy(),
            last_prompt: None,
            generation_counter: 0,
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.composer = HaikuComposer::new(persona, self.composer.counter().clone());
        self
    }

    pub fn with_composer(mut self, composer: HaikuComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_style(mut self, style: StyleGuide) -> Self {
        self.style = style;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persona(&self) -> Persona {
        self.composer.persona()
    }

    pub fn style(&self) -> &StyleGuide {
        &self.style
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    pub fn generation_count(&self) -> u64 {
        self.generation_counter
    }

    /// Write a poem in the given form. Haiku forms go through the syllable
    /// search; anything else gets a short fallback verse.
    pub fn generate_poetry(&mut self, input: impl Into<PromptInput>, form: &FormRules) -> String {
        let input = input.into();
        let prompt = input.prompt().to_string();
        self.last_prompt = Some(prompt.clone());
        self.generation_counter += 1;

        let (kw1, kw2) = prompt_keywords(&prompt);
        info!(
            agent = %self.name,
            form = %form.name,
            lines = form.line_count,
            syllables = ?form.syllables,
            prompt = %prompt,
            "generating poem"
        );

        let lines: Vec<String> = match form.kind {
            FormKind::Haiku => (0..form.line_count)
                .map(|index| {
                    let target = form.target_for_line(index);
                    let line = self.composer.compose_line(&kw1, &kw2, target, &mut self.rng);
                    debug!(
                        agent = %self.name,
                        line = index + 1,
                        target,
                        matched = line.is_match(),
                        "haiku line finished"
                    );
                    line.render()
                })
                .collect(),
            FormKind::Free => self.fallback_verse(&prompt, &kw1, &kw2, form),
        };

        lines.join("\n")
    }

    fn fallback_verse(&self, prompt: &str, kw1: &str, kw2: &str, form: &FormRules) -> Vec<String> {
        let mut lines = vec![
            format!("Prompt: {prompt} ({kw1}, {kw2})"),
            format!("Form rules not for Haiku: {}.", form.name),
            format!("A simple {} verse instead.", self.style.leading_tone()),
        ];
        lines.truncate(form.line_count);
        while lines.len() < form.line_count {
            lines.push("Line added for count.".to_string());
        }
        lines
    }

    /// Read a poem and turn its themes into the next creative prompt.
    pub fn interpret_poetry(&self, poem: &str) -> PromptData {
        let themes = theme_keywords(poem);
        let mut index = themes.primary.chars().count()
            + themes.secondary.chars().count()
            + themes.significant_count;
        let mut prompt = interpretation_prompt(index, &themes.primary, &themes.secondary);

        if self.last_prompt.as_deref() == Some(prompt.as_str()) {
            index += 1;
            prompt = interpretation_prompt(index, &themes.primary, &themes.secondary);
            if self.last_prompt.as_deref() == Some(prompt.as_str()) {
                prompt.push_str(", from a new perspective.");
            }
        }

        let reference = reference_phrase(poem);
        info!(
            agent = %self.name,
            kw1 = %themes.primary,
            kw2 = %themes.secondary,
            reference = %reference,
            prompt = %prompt,
            "interpreted poem"
        );
        PromptData::new(prompt).with_reference(reference)
    }

    pub async fn send_message(
        &self,
        mailbox: &dyn Mailbox,
        recipient_id: &str,
        message_type: &str,
        payload: impl Into<Payload>,
    ) -> Result<Message> {
        let message = Message::new(&self.name, recipient_id, message_type, payload);
        mailbox.deliver(&message).await?;
        Ok(message)
    }

    pub async fn receive_message(&self, mailbox: &dyn Mailbox) -> Result<Option<Message>> {
        mailbox.collect(&self.name).await
    }
}
