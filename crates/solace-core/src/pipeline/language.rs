//! Language resolution for the three supported reply languages.

use serde::{Deserialize, Serialize};

/// Supported reply languages. Anything unrecognized collapses to [`Language::Th`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Th,
    En,
    Cn,
}

impl Language {
    pub fn all() -> [Self; 3] {
        [Self::Th, Self::En, Self::Cn]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Th => "th",
            Self::En => "en",
            Self::Cn => "cn",
        }
    }

    /// Directive steering the model's output language and tone register.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Th => {
                "ตอบเป็นภาษาไทยเท่านั้น ใช้ภาษาที่อบอุ่น สุภาพ และเป็นกันเอง \
                 ลงท้ายด้วยคำว่า ครับ/ค่ะ ตามความเหมาะสม หลีกเลี่ยงศัพท์ทางการแพทย์ที่เข้าใจยาก"
            }
            Self::En => {
                "Reply in English only. Use a warm, plain-spoken and non-judgmental tone. \
                 Avoid clinical jargon and never diagnose."
            }
            Self::Cn => {
                "请只用简体中文回复。语气温暖、真诚、不评判，\
                 避免使用难懂的医学术语，也不要做任何诊断。"
            }
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "th" => Some(Self::Th),
            "en" => Some(Self::En),
            "cn" => Some(Self::Cn),
            _ => None,
        }
    }

    fn is_latin(&self) -> bool {
        matches!(self, Self::En)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Case-insensitive match against the supported codes, defaulting to `th`.
pub fn normalize(code: Option<&str>) -> Language {
    code.and_then(Language::from_code).unwrap_or_default()
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}'
        | '\u{2A700}'..='\u{2EBEF}')
}

fn is_thai(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
}

/// Guess the language from script: any CJK ideograph wins, then any Thai
/// character, else English.
pub fn detect(text: &str) -> Language {
    if text.chars().any(is_cjk_ideograph) {
        Language::Cn
    } else if text.chars().any(is_thai) {
        Language::Th
    } else {
        Language::En
    }
}

/// Pick the operating language from an optional caller hint and the message.
///
/// A blank, absent or unsupported hint defers to [`detect`]. A supported
/// hint is honored unless the message is written in a non-Latin script of a
/// different supported language.
pub fn resolve(hint: Option<&str>, text: &str) -> Language {
    let detected = detect(text);
    match hint.and_then(Language::from_code) {
        None => detected,
        Some(hinted) => {
            if !detected.is_latin() && detected != hinted {
                detected
            } else {
                hinted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_insensitive() {
        assert_eq!(normalize(Some("TH")), Language::Th);
        assert_eq!(normalize(Some("En")), Language::En);
        assert_eq!(normalize(Some(" cn ")), Language::Cn);
        assert_eq!(normalize(Some("TH")), normalize(Some("th")));
    }

    #[test]
    fn test_normalize_defaults_to_thai() {
        assert_eq!(normalize(None), Language::Th);
        assert_eq!(normalize(Some("")), Language::Th);
        assert_eq!(normalize(Some("fr")), Language::Th);
        assert_eq!(normalize(Some("zh")), Language::Th);
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in [None, Some(""), Some("EN"), Some("cn"), Some("xx"), Some("th")] {
            let once = normalize(input);
            assert_eq!(normalize(Some(once.code())), once);
        }
    }

    #[test]
    fn test_detect_scripts() {
        assert_eq!(detect("我很难过"), Language::Cn);
        assert_eq!(detect("ฉันเศร้ามาก"), Language::Th);
        assert_eq!(detect("I feel sad"), Language::En);
        assert_eq!(detect(""), Language::En);
    }

    #[test]
    fn test_detect_mixed_script_prefers_cjk() {
        assert_eq!(detect("ฉันรู้สึก 难过"), Language::Cn);
        assert_eq!(detect("hello สวัสดี"), Language::Th);
    }

    #[test]
    fn test_instructions_distinct_and_non_empty() {
        let all = Language::all();
        for lang in all {
            assert!(!lang.instruction().is_empty());
        }
        assert_ne!(Language::Th.instruction(), Language::En.instruction());
        assert_ne!(Language::Th.instruction(), Language::Cn.instruction());
        assert_ne!(Language::En.instruction(), Language::Cn.instruction());
    }

    #[test]
    fn test_resolve_without_hint_detects() {
        assert_eq!(resolve(None, "我很难过"), Language::Cn);
        assert_eq!(resolve(Some("  "), "I am tired"), Language::En);
    }

    #[test]
    fn test_resolve_unsupported_hint_detects() {
        assert_eq!(resolve(Some("fr"), "I am tired"), Language::En);
        assert_eq!(resolve(Some("jp"), "ฉันเหนื่อย"), Language::Th);
        assert_eq!(resolve(Some("xx"), "我很累"), Language::Cn);
    }

    #[test]
    fn test_resolve_hint_kept_for_latin_text() {
        assert_eq!(resolve(Some("th"), "I am tired"), Language::Th);
        assert_eq!(resolve(Some("CN"), "ok"), Language::Cn);
    }

    #[test]
    fn test_resolve_script_overrides_mismatched_hint() {
        assert_eq!(resolve(Some("en"), "ฉันเหนื่อย"), Language::Th);
        assert_eq!(resolve(Some("th"), "我很累"), Language::Cn);
        assert_eq!(resolve(Some("cn"), "我很累"), Language::Cn);
    }

    #[test]
    fn test_language_serde() {
        assert_eq!(serde_json::to_string(&Language::Cn).unwrap(), "\"cn\"");
        assert_eq!(Language::En.to_string(), "en");
    }
}
