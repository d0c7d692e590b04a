//! Syllable counting: an optional CMU-format pronunciation table with a
//! vowel-group fallback.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{PoetError, Result};

#[derive(Debug, Clone, Default)]
pub struct SyllableCounter {
    dictionary: HashMap<String, u32>,
}

impl SyllableCounter {
    /// Counter that relies on the vowel-group estimate alone.
    pub fn heuristic() -> Self {
        Self::default()
    }

    /// Parse entries of the form `WORD  P1 P2 ...`. Stressed phones (those
    /// ending in a digit) are syllable nuclei. `;;;` comments and alternate
    /// pronunciations such as `WORD(2)` are skipped.
    pub fn from_cmu_text(text: &str) -> Self {
        let mut dictionary = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            if word.ends_with(')') {
                continue;
            }
            let syllables = parts
                .filter(|phone| phone.ends_with(|c: char| c.is_ascii_digit()))
                .count() as u32;
            if syllables > 0 {
                dictionary
                    .entry(word.to_lowercase())
                    .or_insert(syllables);
            }
        }
        Self { dictionary }
    }

    pub fn from_cmu_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            PoetError::Config(format!(
                "failed loading pronunciation dictionary `{}`: {err}",
                path.display()
            ))
        })?;
        Ok(Self::from_cmu_text(&raw))
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    pub fn count_word(&self, word: &str) -> u32 {
        let cleaned = word
            .trim_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        if cleaned.is_empty() {
            return 0;
        }
        if let Some(&count) = self.dictionary.get(&cleaned) {
            return count;
        }
        let estimate = vowel_group_estimate(&cleaned);
        debug!(word = %cleaned, syllables = estimate, "syllable estimate from vowel groups");
        estimate
    }

    pub fn count_line<S: AsRef<str>>(&self, words: &[S]) -> u32 {
        words.iter().map(|w| self.count_word(w.as_ref())).sum()
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Runs of `aeiouy`, minus a silent final `e`, never below one.
fn vowel_group_estimate(word: &str) -> u32 {
    let chars: Vec<char> = word.chars().collect();
    let mut groups = 0u32;
    let mut previous_vowel = false;
    for &c in &chars {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }

    let n = chars.len();
    if n > 2 && word.ends_with('e') && !word.ends_with("le") && groups > 1 && !is_vowel(chars[n - 2]) {
        groups -= 1;
    }
    groups.max(1)
}
