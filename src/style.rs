//! Static style guide and poetic form rules.

use serde::{Deserialize, Serialize};

pub const HAIKU_FORM_NAME: &str = "Haiku (3 lines, 5-7-5 syllables)";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricalForms {
    pub preference: String,
    pub occasional_free_verse: bool,
    pub common_meters: Vec<String>,
    pub rhyme_schemes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageRules {
    pub avoid_archaic_language: bool,
    pub avoid_cliches: bool,
    pub freshness_of_language: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageryFocus {
    pub use_concrete_words: bool,
    pub emphasize_sensory_imagery: bool,
    pub vivid_descriptions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FigurativeLanguage {
    pub metaphor_usage: String,
    pub simile_usage: String,
}

/// Narrative preferences handed to every poet. Only the fallback verse reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StyleGuide {
    pub genre_preference: String,
    pub metrical_forms: MetricalForms,
    pub language_rules: LanguageRules,
    pub imagery_focus: ImageryFocus,
    pub figurative_language: FigurativeLanguage,
    pub overall_tone: Vec<String>,
}

impl StyleGuide {
    /// Narrative-epic verse in strict meter.
    pub fn turner() -> Self {
        Self {
            genre_preference: "narrative_epic".into(),
            metrical_forms: MetricalForms {
                preference: "strict".into(),
                occasional_free_verse: true,
                common_meters: vec!["iambic_pentameter".into()],
                rhyme_schemes: vec!["aabb".into(), "abab".into(), "custom".into()],
            },
            language_rules: LanguageRules {
                avoid_archaic_language: true,
                avoid_cliches: true,
                freshness_of_language: true,
            },
            imagery_focus: ImageryFocus {
                use_concrete_words: true,
                emphasize_sensory_imagery: true,
                vivid_descriptions: true,
            },
            figurative_language: FigurativeLanguage {
                metaphor_usage: "frequent_for_deeper_meaning".into(),
                simile_usage: "frequent_for_deeper_meaning".into(),
            },
            overall_tone: vec![
                "narrative".into(),
                "reflective".into(),
                "philosophical".into(),
            ],
        }
    }

    pub fn leading_tone(&self) -> &str {
        self.overall_tone
            .first()
            .map(String::as_str)
            .unwrap_or("simple")
    }
}

impl Default for StyleGuide {
    fn default() -> Self {
        Self::turner()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Haiku,
    Free,
}

/// Shape a generated poem must take.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormRules {
    pub name: String,
    pub kind: FormKind,
    #[serde(default = "default_line_count")]
    pub line_count: usize,
    #[serde(default = "default_syllables")]
    pub syllables: Vec<u32>,
    #[serde(default)]
    pub rhyme_scheme: Option<String>,
}

fn default_line_count() -> usize {
    3
}

fn default_syllables() -> Vec<u32> {
    vec![5, 7, 5]
}

impl FormRules {
    pub fn haiku() -> Self {
        Self {
            name: HAIKU_FORM_NAME.into(),
            kind: FormKind::Haiku,
            line_count: 3,
            syllables: vec![5, 7, 5],
            rhyme_scheme: None,
        }
    }

    pub fn free(name: impl Into<String>, line_count: usize) -> Self {
        Self {
            name: name.into(),
            kind: FormKind::Free,
            line_count,
            syllables: Vec::new(),
            rhyme_scheme: None,
        }
    }

    /// Syllable target for a zero-based line index; lines past the list get 0.
    pub fn target_for_line(&self, index: usize) -> u32 {
        self.syllables.get(index).copied().unwrap_or(0)
    }
}

impl Default for FormRules {
    fn default() -> Self {
        Self::haiku()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_leads_with_narrative_tone() {
        let style = StyleGuide::default();
        assert_eq!(style.leading_tone(), "narrative");
        assert_eq!(style.metrical_forms.common_meters, vec!["iambic_pentameter"]);
    }

    #[test]
    fn form_rules_fill_missing_fields_from_toml() {
        let rules: FormRules = toml::from_str("name = 'Couplet'\nkind = 'free'").unwrap();
        assert_eq!(rules.line_count, 3);
        assert_eq!(rules.target_for_line(1), 7);
        assert_eq!(rules.target_for_line(5), 0);
        assert_eq!(rules.kind, FormKind::Free);
    }
}
