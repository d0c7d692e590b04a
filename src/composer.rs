//! Haiku line search.
//!
//! A line starts from one of the persona's seed patterns and is nudged one
//! word at a time toward its syllable target until it lands or the attempt
//! budget runs out.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::syllables::SyllableCounter;

pub const DEFAULT_MAX_LINE_ATTEMPTS: usize = 30;

const ALPHA_ONE_SYLLABLE: &[&str] = &[
    "wise", "deep", "clear", "true", "strong", "form", "thus", "one", "all", "past", "vast",
    "still", "mark", "fact",
];
const ALPHA_TWO_SYLLABLE: &[&str] = &[
    "reason", "logic", "future", "structure", "order", "wisdom", "pattern", "essence", "concept",
];
const BETA_ONE_SYLLABLE: &[&str] = &[
    "soft", "light", "hush", "mist", "far", "dim", "soul", "dream", "now", "deep", "calm", "sky",
    "moon", "star",
];
const BETA_TWO_SYLLABLE: &[&str] = &[
    "hidden", "secret", "spirit", "wonder", "magic", "echo", "flowing", "drifting", "fading",
];
const BETA_ENDINGS: &[&str] = &["...", ".", "!"];

/// Voice of a poet: which word lists, seed patterns and line endings it uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Measured and logical.
    Alpha,
    /// Dreamy and drifting.
    Beta,
}

impl Persona {
    pub fn for_agent_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("alpha") {
            Persona::Alpha
        } else {
            Persona::Beta
        }
    }

    pub fn one_syllable_words(self) -> &'static [&'static str] {
        match self {
            Persona::Alpha => ALPHA_ONE_SYLLABLE,
            Persona::Beta => BETA_ONE_SYLLABLE,
        }
    }

    pub fn two_syllable_words(self) -> &'static [&'static str] {
        match self {
            Persona::Alpha => ALPHA_TWO_SYLLABLE,
            Persona::Beta => BETA_TWO_SYLLABLE,
        }
    }

    fn seed_patterns<R: Rng>(self, kw1: &str, kw2: &str, rng: &mut R) -> Vec<Vec<String>> {
        let one = pick(self.one_syllable_words(), rng);
        let two = pick(self.two_syllable_words(), rng);
        match self {
            Persona::Alpha => vec![
                owned(&[kw1, one, kw2]),
                owned(&[two, kw1]),
                owned(&[kw1, "is", kw2]),
            ],
            Persona::Beta => vec![
                owned(&[one, kw1, kw2]),
                owned(&[kw1, "like", two]),
                owned(&["Ah,", kw1]),
            ],
        }
    }

    fn line_ending<R: Rng>(self, rng: &mut R) -> &'static str {
        match self {
            Persona::Alpha => ".",
            Persona::Beta => pick(BETA_ENDINGS, rng),
        }
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn pick<R: Rng>(words: &'static [&'static str], rng: &mut R) -> &'static str {
    words.choose(rng).copied().unwrap_or("still")
}

/// First character upper-cased, everything after it lower-cased.
pub fn capitalize(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Result of searching for one haiku line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposedLine {
    Matched { text: String, syllables: u32 },
    Missed { words: String, target: u32, syllables: u32 },
}

impl ComposedLine {
    pub fn is_match(&self) -> bool {
        matches!(self, ComposedLine::Matched { .. })
    }

    /// The line as it appears in the poem.
    pub fn render(&self) -> String {
        match self {
            ComposedLine::Matched { text, .. } => text.clone(),
            ComposedLine::Missed {
                words,
                target,
                syllables,
            } => format!("({words} - {target} syl target not met; got {syllables})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HaikuComposer {
    persona: Persona,
    counter: SyllableCounter,
    max_attempts: usize,
}

impl HaikuComposer {
    pub fn new(persona: Persona, counter: SyllableCounter) -> Self {
        Self {
            persona,
            counter,
            max_attempts: DEFAULT_MAX_LINE_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn counter(&self) -> &SyllableCounter {
        &self.counter
    }

    pub fn compose_line<R: Rng>(
        &self,
        kw1: &str,
        kw2: &str,
        target: u32,
        rng: &mut R,
    ) -> ComposedLine {
        let kw1 = if kw1.trim().is_empty() { "theme" } else { kw1 };
        let kw2 = if kw2.trim().is_empty() { "idea" } else { kw2 };
        let one_syllable = self.persona.one_syllable_words();

        let mut patterns = self.persona.seed_patterns(kw1, kw2, rng);
        let index = rng.gen_range(0..patterns.len());
        let mut words = patterns.swap_remove(index);

        let mut best = BestAttempt::new(words.clone(), self.counter.count_line(&words));

        for attempt in 1..=self.max_attempts {
            words.retain(|w| !w.trim().is_empty());
            if words.is_empty() {
                words.push(pick(one_syllable, rng).to_string());
            }

            let syllables = self.counter.count_line(&words);
            debug!(
                attempt,
                line = %words.join(" "),
                syllables,
                target,
                "haiku line attempt"
            );

            if syllables == target {
                let text = format!(
                    "{}{}",
                    capitalize(&words.join(" ")),
                    self.persona.line_ending(rng)
                );
                return ComposedLine::Matched { text, syllables };
            }

            best.consider(&words, syllables, target);
            self.adjust(&mut words, syllables, target, [kw1, kw2], rng);
        }

        best.into_missed(target)
    }

    /// One edit toward `target`: grow a short line by a word sized to the
    /// gap, shrink a long one from the end, or swap a lone long word for a
    /// one-syllable word. A two-word line ending on a keyword loses its first
    /// word instead of the keyword.
    fn adjust<R: Rng>(
        &self,
        words: &mut Vec<String>,
        syllables: u32,
        target: u32,
        keywords: [&str; 2],
        rng: &mut R,
    ) {
        if syllables < target {
            let word = if target - syllables >= 2 {
                pick(self.persona.two_syllable_words(), rng)
            } else {
                pick(self.persona.one_syllable_words(), rng)
            };
            words.push(word.to_string());
        } else if words.len() > 1 {
            let last_is_keyword = words
                .last()
                .map(|w| keywords.iter().any(|k| w.as_str() == *k))
                .unwrap_or(false);
            if last_is_keyword && words.len() == 2 {
                words.remove(0);
            } else {
                words.pop();
            }
        } else {
            *words = vec![pick(self.persona.one_syllable_words(), rng).to_string()];
        }
    }
}

/// Closest line seen so far. Ties in distance go to the longer count.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BestAttempt {
    words: Vec<String>,
    syllables: u32,
}

impl BestAttempt {
    fn new(words: Vec<String>, syllables: u32) -> Self {
        Self { words, syllables }
    }

    fn consider(&mut self, words: &[String], syllables: u32, target: u32) {
        let distance = syllables.abs_diff(target);
        let best_distance = self.syllables.abs_diff(target);
        if distance < best_distance || (distance == best_distance && syllables > self.syllables) {
            self.words = words.to_vec();
            self.syllables = syllables;
        }
    }

    fn into_missed(self, target: u32) -> ComposedLine {
        ComposedLine::Missed {
            words: self.words.join(" "),
            target,
            syllables: self.syllables,
        }
    }
}
