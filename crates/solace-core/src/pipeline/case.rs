//! Case-type selection.
//!
//! Maps free text to a coarse emotional category and each category to a
//! therapeutic framing fragment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse emotional category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Anxiety,
    Sadness,
    Anger,
    Loneliness,
    Stress,
    Grief,
    Shame,
    Burnout,
    Relationship,
    #[default]
    General,
}

impl CaseType {
    pub fn all() -> [Self; 10] {
        [
            Self::Anxiety,
            Self::Sadness,
            Self::Anger,
            Self::Loneliness,
            Self::Stress,
            Self::Grief,
            Self::Shame,
            Self::Burnout,
            Self::Relationship,
            Self::General,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Anxiety => "anxiety",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Loneliness => "loneliness",
            Self::Stress => "stress",
            Self::Grief => "grief",
            Self::Shame => "shame",
            Self::Burnout => "burnout",
            Self::Relationship => "relationship",
            Self::General => "general",
        }
    }

    /// Parse a case-type name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::all().into_iter().find(|c| c.name() == name)
    }

    /// Focus, stigma to counter and goal for this category.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Anxiety => {
                "Case: anxiety. Focus on grounding the user in the present moment and \
                 naming the worry concretely. Counter the stigma that anxiety is weakness \
                 or overreaction. Goal: help the user separate what they can control from \
                 what they cannot and offer one small calming step."
            }
            Self::Sadness => {
                "Case: sadness. Focus on acknowledging the feeling without rushing to fix it. \
                 Counter the stigma that sadness must be hidden or is a burden to others. \
                 Goal: help the user feel heard and identify one gentle source of support."
            }
            Self::Anger => {
                "Case: anger. Focus on the need or boundary underneath the anger. Counter the \
                 stigma that feeling angry makes someone a bad person. Goal: validate the \
                 emotion while exploring safe ways to express it."
            }
            Self::Loneliness => {
                "Case: loneliness. Focus on the user's longing for connection. Counter the \
                 stigma that being lonely means being unlikeable. Goal: affirm their worth \
                 and explore one realistic way to reconnect with someone."
            }
            Self::Stress => {
                "Case: stress. Focus on the specific pressures the user is carrying. Counter \
                 the stigma that struggling under pressure means failing. Goal: break the load \
                 into manageable pieces and encourage rest."
            }
            Self::Grief => {
                "Case: grief. Focus on honoring the loss and the relationship behind it. \
                 Counter the stigma that grief should follow a timeline or be over by now. \
                 Goal: make space for memories and normalize the waves of grief."
            }
            Self::Shame => {
                "Case: shame. Focus on separating the user's actions from their worth. \
                 Counter the stigma that mistakes define a person. Goal: replace harsh \
                 self-judgment with self-compassion."
            }
            Self::Burnout => {
                "Case: burnout. Focus on exhaustion and depleted motivation. Counter the \
                 stigma that rest is laziness. Goal: validate the need to recover and explore \
                 boundaries around work and obligations."
            }
            Self::Relationship => {
                "Case: relationship. Focus on the user's feelings and needs within the \
                 relationship rather than judging the other person. Counter the stigma that \
                 relationship pain is trivial. Goal: clarify what the user wants and support \
                 healthy communication."
            }
            Self::General => {
                "Case: general. Focus on listening carefully and reflecting what the user \
                 shares. Counter the stigma that seeking emotional support is unnecessary. \
                 Goal: help the user name what they feel and what they need right now."
            }
        }
    }
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Instruction fragment for a case-type name; unknown or absent names get `general`.
pub fn case_instruction(case_type: Option<&str>) -> &'static str {
    case_type
        .and_then(CaseType::parse)
        .unwrap_or_default()
        .instruction()
}

/// Keyword rules in evaluation order. The first matching rule wins, so
/// categories with the most specific vocabulary come first:
/// grief, burnout, shame, relationship, loneliness, anger, anxiety, sadness, stress.
const CASE_RULES: &[(CaseType, &[&str])] = &[
    (
        CaseType::Grief,
        &[
            r"\bgrie(?:f|ve|ving)", r"passed away", r"\bfuneral", r"bereave", r"\bmourn",
            "สูญเสีย", "เสียชีวิต", "จากไป", "ไว้อาลัย",
            "去世", "过世", "悲痛", "失去了",
        ],
    ),
    (
        CaseType::Burnout,
        &[
            r"burn(?:ed|t)?\s*out", r"\bexhaust", r"\bdrained", r"overwork",
            "หมดไฟ", "เหนื่อยล้า", "หมดแรง",
            "倦怠", "精疲力尽", "过劳", "累垮",
        ],
    ),
    (
        CaseType::Shame,
        &[
            r"\bashamed", r"\bshame", r"embarrass", r"humiliat", r"worthless", r"\bguilt",
            "อับอาย", "ละอาย", "ไร้ค่า", "รู้สึกผิด",
            "羞耻", "丢脸", "惭愧", "内疚", "没用",
        ],
    ),
    (
        CaseType::Relationship,
        &[
            r"break\s*up", r"broke\s*up", r"boyfriend", r"girlfriend", r"\bpartner",
            r"\bhusband", r"\bwife\b", r"divorce", r"relationship", r"\bcheat",
            "แฟน", "เลิกกัน", "อกหัก", "สามี", "ภรรยา",
            "分手", "男朋友", "女朋友", "离婚", "伴侣", "感情",
        ],
    ),
    (
        CaseType::Loneliness,
        &[
            r"\blonel", r"\balone\b", r"isolat", r"no friends", r"left out",
            "เหงา", "โดดเดี่ยว", "ตัวคนเดียว",
            "孤独", "寂寞", "孤单",
        ],
    ),
    (
        CaseType::Anger,
        &[
            r"\bangry", r"\banger", r"furious", r"\brage\b", r"\bmad\b", r"\bhate",
            r"irritat", r"annoyed",
            "โกรธ", "โมโห", "หงุดหงิด",
            "生气", "愤怒", "恼火", "气死",
        ],
    ),
    (
        CaseType::Anxiety,
        &[
            r"\banxi", r"\bworr", r"\bpanic", r"nervous", r"afraid", r"scared", r"\bfear",
            "กังวล", "วิตก", "ตื่นตระหนก", "กลัว",
            "焦虑", "担心", "紧张", "恐慌", "害怕",
        ],
    ),
    (
        CaseType::Sadness,
        &[
            r"\bsad", r"depress", r"\bcry", r"\bcried", r"unhappy", r"miserable", r"heartbroken",
            "เศร้า", "ร้องไห้", "เสียใจ", "หดหู่",
            "难过", "伤心", "悲伤", "哭", "沮丧",
        ],
    ),
    (
        CaseType::Stress,
        &[
            r"stress", r"pressure", r"overwhelm", r"deadline", r"too much",
            "เครียด", "กดดัน",
            "压力", "崩溃", "烦躁",
        ],
    ),
];

static CASE_PATTERNS: Lazy<Vec<(CaseType, Regex)>> = Lazy::new(|| {
    CASE_RULES
        .iter()
        .map(|(case, keywords)| {
            let source = format!("(?i)(?:{})", keywords.join("|"));
            (*case, Regex::new(&source).expect("invalid case-type pattern"))
        })
        .collect()
});

/// Classify text into a case type. First matching rule wins; no match is `general`.
pub fn detect_case_type(text: &str) -> CaseType {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return CaseType::General;
    }
    CASE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(trimmed))
        .map(|(case, _)| *case)
        .unwrap_or_default()
}
