//! Keyword extraction over prompts and poems.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "should", "can", "could", "may", "might", "must",
    "and", "but", "or", "nor", "for", "so", "yet", "if", "then", "else", "when", "where",
    "why", "how", "what", "which", "who", "whom", "whose", "of", "at", "by", "from", "to",
    "in", "out", "on", "off", "over", "under", "again", "further", "once", "here", "there",
    "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "not", "only", "own", "same", "than", "too", "very", "s", "t", "just", "don",
    "shouldve", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "couldn",
    "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn", "needn",
    "shan", "shouldn", "wasn", "weren", "won", "wouldn", "i", "me", "my", "myself",
    "we", "our", "ours", "ourselves", "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself",
    "they", "them", "their", "theirs", "themselves",
    // template and persona vocabulary that should never come back as a theme
    "prompt", "kw1", "kw2", "reference_phrase", "alpha", "beta", "noted", "turn", "core",
    "argument", "attempt", "proceed", "foundation", "seed", "logic", "creed", "elaborates",
    "need", "leads", "reflections", "confines", "unblocked", "thesis", "interlocked",
    "concludes", "unlock", "spun", "dream", "sun", "fun", "muses", "run", "alight", "stray",
    "yesterday", "spirit", "wanders", "play", "bloomed", "shimmer", "gloom", "fancies", "roam",
    "home",
];

pub const DEFAULT_PROMPT_KEYWORDS: (&str, &str) = ("frog", "water");
pub const DEFAULT_THEMES: (&str, &str) = ("mystery", "silence");

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

pub fn is_stopword(word: &str) -> bool {
    stopwords().contains(word)
}

fn related_theme(word: &str) -> Option<&'static str> {
    let related = match word {
        "stars" => "sky",
        "dream" => "sleep",
        "night" => "day",
        "light" => "dark",
        "love" => "heart",
        "time" => "eternity",
        "ocean" => "sea",
        "cosmic" => "universe",
        "robot" => "future",
        "song" => "melody",
        "lonely" => "solitude",
        "space" => "void",
        _ => return None,
    };
    Some(related)
}

/// First two tokens of the prompt longer than three letters that are not stopwords.
pub fn prompt_keywords(prompt: &str) -> (String, String) {
    let cleaned: String = prompt
        .chars()
        .flat_map(|c| {
            let keep = c.is_alphanumeric() || c == '\'' || c.is_whitespace();
            let replacement = if keep { c } else { ' ' };
            replacement.to_lowercase()
        })
        .collect();

    let mut words = cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 3 && !is_stopword(word));
    let kw1 = words.next().unwrap_or(DEFAULT_PROMPT_KEYWORDS.0).to_string();
    let kw2 = words.next().unwrap_or(DEFAULT_PROMPT_KEYWORDS.1).to_string();
    (kw1, kw2)
}

/// Lowercase, drop ASCII punctuation except apostrophes, keep non-stopwords over two letters.
pub fn significant_words(poem: &str) -> Vec<String> {
    let normalized: String = poem
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() || *c == '\'')
        .collect();
    normalized
        .split_whitespace()
        .filter(|word| !is_stopword(word) && word.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Themes {
    pub primary: String,
    pub secondary: String,
    pub significant_count: usize,
}

/// The two most frequent significant words, ties broken by first appearance.
pub fn theme_keywords(poem: &str) -> Themes {
    let words = significant_words(poem);
    if words.is_empty() {
        return Themes {
            primary: DEFAULT_THEMES.0.into(),
            secondary: DEFAULT_THEMES.1.into(),
            significant_count: 0,
        };
    }

    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        match index.get(word.as_str()) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(word.as_str(), order.len());
                order.push((word.as_str(), 1));
            }
        }
    }
    // stable, so equal counts keep first-appearance order
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let primary = order[0].0.to_string();
    let secondary = match order.get(1) {
        Some((word, _)) => word.to_string(),
        None => {
            let related = related_theme(&primary).unwrap_or("meaning");
            if related == primary {
                let fallback = if primary == "essence" { "depth" } else { "essence" };
                fallback.to_string()
            } else {
                related.to_string()
            }
        }
    };

    Themes {
        primary,
        secondary,
        significant_count: words.len(),
    }
}

/// A short phrase quoting the poem, used as the reference for the next prompt.
pub fn reference_phrase(poem: &str) -> String {
    let lines: Vec<&str> = poem.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    for line in &lines {
        let significant: Vec<&str> = line
            .split_whitespace()
            .filter(|w| w.chars().count() >= 3 && !is_stopword(&w.to_lowercase()))
            .collect();
        if significant.len() >= 2 {
            return significant.into_iter().take(4).collect::<Vec<_>>().join(" ");
        }
    }

    lines
        .first()
        .map(|line| line.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}
