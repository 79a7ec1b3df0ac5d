//! Voice and language catalogs.
//!
//! Two const arrays are provided:
//! - [`VOICES`]: the prebuilt voices the speech model accepts
//! - [`LANGUAGES`]: the target languages offered in the UI
//!
//! Records store the resolved names as plain strings, so entries can be
//! added or renamed here without touching existing history.

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Perceived gender of a prebuilt voice, shown next to its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceOption
// ---------------------------------------------------------------------------

/// Static metadata for one prebuilt voice.
#[derive(Debug)]
pub struct VoiceOption {
    /// Identifier sent to the API as `voiceName` (e.g. `"Kore"`).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    pub gender: Gender,
    /// Short personality description; the prompt asks the model to match it.
    pub style: &'static str,
}

impl VoiceOption {
    /// Combo-box text, e.g. `"Kore (Female, Soothing)"`.
    pub fn display_label(&self) -> String {
        format!("{} ({}, {})", self.name, self.gender.label(), self.style)
    }
}

/// All prebuilt voices, in UI order.
pub const VOICES: &[VoiceOption] = &[
    VoiceOption {
        id: "Kore",
        name: "Kore",
        gender: Gender::Female,
        style: "Soothing",
    },
    VoiceOption {
        id: "Puck",
        name: "Puck",
        gender: Gender::Male,
        style: "Low & Calm",
    },
    VoiceOption {
        id: "Charon",
        name: "Charon",
        gender: Gender::Male,
        style: "Deep",
    },
    VoiceOption {
        id: "Fenrir",
        name: "Fenrir",
        gender: Gender::Male,
        style: "Intense",
    },
    VoiceOption {
        id: "Orpheus",
        name: "Orpheus",
        gender: Gender::Male,
        style: "Confident",
    },
    VoiceOption {
        id: "Zephyr",
        name: "Zephyr",
        gender: Gender::Female,
        style: "Bright",
    },
];

// ---------------------------------------------------------------------------
// LanguageOption
// ---------------------------------------------------------------------------

/// Static metadata for one target language.
#[derive(Debug)]
pub struct LanguageOption {
    /// ISO-639-1 code.
    pub code: &'static str,
    /// English name; this is what the prompt and the record carry.
    pub name: &'static str,
    pub flag: &'static str,
}

impl LanguageOption {
    /// Combo-box text, e.g. `"🇮🇹 Italian"`.
    pub fn display_label(&self) -> String {
        format!("{} {}", self.flag, self.name)
    }
}

/// All supported languages, in UI order.
pub const LANGUAGES: &[LanguageOption] = &[
    LanguageOption { code: "en", name: "English", flag: "🇬🇧" },
    LanguageOption { code: "it", name: "Italian", flag: "🇮🇹" },
    LanguageOption { code: "es", name: "Spanish", flag: "🇪🇸" },
    LanguageOption { code: "fr", name: "French", flag: "🇫🇷" },
    LanguageOption { code: "de", name: "German", flag: "🇩🇪" },
    LanguageOption { code: "ja", name: "Japanese", flag: "🇯🇵" },
    LanguageOption { code: "ko", name: "Korean", flag: "🇰🇷" },
    LanguageOption { code: "pt", name: "Portuguese", flag: "🇧🇷" },
];

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Find a voice by its API id.
pub fn find_voice(id: &str) -> Option<&'static VoiceOption> {
    VOICES.iter().find(|v| v.id == id)
}

/// Find a language by English name (case-insensitive) or ISO code.
pub fn find_language(name_or_code: &str) -> Option<&'static LanguageOption> {
    LANGUAGES
        .iter()
        .find(|l| l.name.eq_ignore_ascii_case(name_or_code) || l.code == name_or_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn voice_ids_are_unique() {
        let ids: HashSet<_> = VOICES.iter().map(|v| v.id).collect();
        assert_eq!(ids.len(), VOICES.len());
    }

    #[test]
    fn language_codes_are_unique() {
        let codes: HashSet<_> = LANGUAGES.iter().map(|l| l.code).collect();
        assert_eq!(codes.len(), LANGUAGES.len());
    }

    #[test]
    fn find_voice_known_and_unknown() {
        assert_eq!(find_voice("Kore").map(|v| v.gender), Some(Gender::Female));
        assert_eq!(find_voice("Charon").map(|v| v.style), Some("Deep"));
        assert!(find_voice("kore").is_none());
        assert!(find_voice("Nobody").is_none());
    }

    #[test]
    fn find_language_by_name_or_code() {
        assert_eq!(find_language("Italian").map(|l| l.code), Some("it"));
        assert_eq!(find_language("german").map(|l| l.code), Some("de"));
        assert_eq!(find_language("ja").map(|l| l.name), Some("Japanese"));
        assert!(find_language("Klingon").is_none());
    }

    #[test]
    fn display_labels() {
        let kore = find_voice("Kore").unwrap();
        assert_eq!(kore.display_label(), "Kore (Female, Soothing)");
        let it = find_language("it").unwrap();
        assert_eq!(it.display_label(), "🇮🇹 Italian");
    }
}
