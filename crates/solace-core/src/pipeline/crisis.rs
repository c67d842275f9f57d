//! Crisis screening.
//!
//! A fixed, ordered allow-list of case-insensitive patterns per language.
//! A message is a crisis message if any pattern matches anywhere in it,
//! including inside longer or mixed-language sentences. There is no scoring:
//! a false negative is worse than a false positive.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::input::{validate_value, Validation};
use super::language::Language;

/// Fixed `message` value of every crisis payload.
pub const CRISIS_MESSAGE: &str = "CRISIS_DETECTED";

/// Pattern sources, evaluated in this order.
const PATTERN_SOURCES: &[(Language, &str)] = &[
    // Thai
    (Language::Th, r"อยากตาย"),
    (Language::Th, r"ฆ่าตัวตาย"),
    (Language::Th, r"ไม่อยากมีชีวิต"),
    (Language::Th, r"ไม่อยากอยู่แล้ว"),
    (Language::Th, r"จบชีวิต"),
    (Language::Th, r"ทำร้ายตัวเอง"),
    // English
    (Language::En, r"suicid"),
    (Language::En, r"kill\s*my\s*self"),
    (Language::En, r"(?:want|wanna)\s*(?:to\s*)?die"),
    (Language::En, r"end\s*(?:my|it)\s*(?:life|all)"),
    (Language::En, r"self[\s-]*harm"),
    (Language::En, r"hurt\s*my\s*self"),
    (Language::En, r"no\s*reason\s*to\s*live"),
    // Chinese
    (Language::Cn, r"自杀"),
    (Language::Cn, r"想死"),
    (Language::Cn, r"不想活"),
    (Language::Cn, r"活不下去"),
    (Language::Cn, r"结束(?:我的)?生命"),
    (Language::Cn, r"自残"),
    (Language::Cn, r"轻生"),
];

struct CrisisPattern {
    language: Language,
    regex: Regex,
}

static PATTERNS: Lazy<Vec<CrisisPattern>> = Lazy::new(|| {
    PATTERN_SOURCES
        .iter()
        .map(|(language, source)| CrisisPattern {
            language: *language,
            regex: Regex::new(&format!("(?i){source}")).expect("invalid crisis pattern"),
        })
        .collect()
});

/// An emergency contact shown with every crisis payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisResource {
    pub name: String,
    pub info: String,
}

/// Payload returned to the caller instead of an AI reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisResponse {
    pub crisis: bool,
    pub message: String,
    pub resources: Vec<CrisisResource>,
}

/// Outcome of a crisis check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrisisCheck {
    Crisis(CrisisResponse),
    NoCrisis,
}

impl CrisisCheck {
    pub fn is_crisis(&self) -> bool {
        matches!(self, CrisisCheck::Crisis(_))
    }
}

const RESOURCES: &[(&str, &str)] = &[
    ("Department of Mental Health Hotline", "1323"),
    ("Samaritans of Thailand", "02-113-6789"),
    ("Emergency Medical Services", "1669"),
];

/// Languages covered by the pattern set, with their pattern counts.
pub fn pattern_counts() -> Vec<(Language, usize)> {
    Language::all()
        .into_iter()
        .map(|lang| (lang, PATTERNS.iter().filter(|p| p.language == lang).count()))
        .collect()
}

/// Language of the first pattern that matches `text`, if any.
pub fn matched_language(text: &str) -> Option<Language> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    PATTERNS
        .iter()
        .find(|p| p.regex.is_match(trimmed))
        .map(|p| p.language)
}

/// Whether `text` contains any crisis pattern.
pub fn detect_text(text: &str) -> bool {
    matched_language(text).is_some()
}

/// Total over arbitrary JSON: non-strings and blank strings are never crises.
pub fn detect(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => detect_text(s),
        _ => false,
    }
}

/// Build the fixed crisis payload. Independent of the detected language.
pub fn create_response() -> CrisisResponse {
    CrisisResponse {
        crisis: true,
        message: CRISIS_MESSAGE.to_string(),
        resources: RESOURCES
            .iter()
            .map(|(name, info)| CrisisResource {
                name: name.to_string(),
                info: info.to_string(),
            })
            .collect(),
    }
}

/// Normalize, screen and build the payload in one step.
pub fn handle_check(value: Option<&Value>) -> CrisisCheck {
    match validate_value(value) {
        Validation::Valid(text) => check_text(&text),
        Validation::Invalid(_) => CrisisCheck::NoCrisis,
    }
}

/// Screen already-normalized text.
pub fn check_text(text: &str) -> CrisisCheck {
    match matched_language(text) {
        Some(language) => {
            tracing::warn!("Crisis pattern matched (pattern language: {})", language);
            CrisisCheck::Crisis(create_response())
        }
        None => CrisisCheck::NoCrisis,
    }
}
