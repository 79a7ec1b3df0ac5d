//! Prompt builder for speech generation.
//!
//! The speech model takes a single text part.  [`PromptBuilder`] wraps the
//! user's text in a short instruction block that pins the spoken language,
//! forbids spoken preambles and embeds language-specific pronunciation
//! hints from a static table.

// ---------------------------------------------------------------------------
// Pronunciation rules
// ---------------------------------------------------------------------------

/// Italian: `W` is an exclamation ("Viva"), a `V` in names, or English in
/// loanwords.
const PRONUNCIATION_IT: &str = "\
Pronunciation Rules for 'W':
     1. If 'W' appears as an isolated capital letter exclamation (e.g., 'W l'Italia', 'W la pizza'), pronounce it as the word 'Viva'.
     2. If 'W' is in a German/Italian name (e.g., 'Walter'), pronounce it as 'V'.
     3. If 'W' is in an English loanword (e.g., 'Web', 'Weekend'), pronounce it naturally as in English.";

/// German: `w` is voiced as `v`.
const PRONUNCIATION_DE: &str = "Pronounce the letter 'w' as 'v' (like in 'vet').";

/// Pronunciation hints for `language` (English name), or `""` when the
/// language has none.
pub fn pronunciation_rules(language: &str) -> &'static str {
    match language {
        "Italian" => PRONUNCIATION_IT,
        "German" => PRONUNCIATION_DE,
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the text part sent with a speech request.
///
/// # Example
/// ```rust
/// use tts_studio::gateway::PromptBuilder;
///
/// let prompt = PromptBuilder::new("German").build("Wasser");
/// assert!(prompt.contains("Read the following text aloud in German."));
/// assert!(prompt.contains("'w' as 'v'"));
/// assert!(prompt.contains("Text to read: \"Wasser\""));
/// ```
pub struct PromptBuilder {
    language: String,
}

impl PromptBuilder {
    /// Create a builder for the given language name (e.g. `"Italian"`).
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Build the full prompt.
    ///
    /// Structure (in order):
    /// 1. Task line naming the language
    /// 2. "Audio only, no preamble" rule
    /// 3. Pronunciation rules (empty for most languages)
    /// 4. Tone rule
    /// 5. The quoted text
    pub fn build(&self, text: &str) -> String {
        let mut prompt = String::with_capacity(512 + text.len());
        prompt.push_str(&format!(
            "Task: Read the following text aloud in {}.\n\n",
            self.language
        ));
        prompt.push_str("Instructions:\n");
        prompt.push_str(
            "1. Only output the spoken audio of the text. \
             Do not add introductory phrases like \"Here is the text\".\n",
        );
        prompt.push_str(&format!(
            "2. {}\n",
            pronunciation_rules(&self.language)
        ));
        prompt.push_str("3. Read the text with the tone matching the voice personality.\n\n");
        prompt.push_str(&format!("Text to read: \"{}\"\n", text));
        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_language_and_quotes_text() {
        let prompt = PromptBuilder::new("English").build("Hello world");

        assert!(prompt.starts_with("Task: Read the following text aloud in English."));
        assert!(prompt.contains("Text to read: \"Hello world\""));
    }

    #[test]
    fn prompt_forbids_preamble_and_sets_tone() {
        let prompt = PromptBuilder::new("French").build("Bonjour");

        assert!(prompt.contains("Only output the spoken audio"));
        assert!(prompt.contains("Here is the text"));
        assert!(prompt.contains("tone matching the voice personality"));
    }

    #[test]
    fn italian_prompt_contains_w_rules() {
        let prompt = PromptBuilder::new("Italian").build("W l'Italia");

        assert!(prompt.contains("'Viva'"), "exclamation rule missing");
        assert!(prompt.contains("'Walter'"), "name rule missing");
        assert!(prompt.contains("'Weekend'"), "loanword rule missing");
    }

    #[test]
    fn german_prompt_contains_w_as_v() {
        let prompt = PromptBuilder::new("German").build("Wasser");
        assert!(prompt.contains("Pronounce the letter 'w' as 'v'"));
    }

    #[test]
    fn other_languages_have_no_rules() {
        assert_eq!(pronunciation_rules("English"), "");
        assert_eq!(pronunciation_rules("Japanese"), "");

        let prompt = PromptBuilder::new("Spanish").build("Hola");
        assert!(!prompt.contains("Pronounce"));
        assert!(prompt.contains("2. \n"));
    }
}
