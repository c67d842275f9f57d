//! Account-tier mode selection and instruction bundle composition.

use serde::{Deserialize, Serialize};

use super::case::CaseType;
use super::language::Language;
use crate::config::ModesConfig;

/// Default output ceiling for premium accounts.
pub const PREMIUM_MAX_TOKENS: u32 = 1500;
/// Default output ceiling for free accounts.
pub const FREE_MAX_TOKENS: u32 = 600;

const PREMIUM_INSTRUCTION: &str = "Mode: premium. Give a deeper, analytical response: \
     reflect the user's feelings, explore possible underlying patterns, and offer two or \
     three concrete coping strategies. Aim for a thorough answer of several paragraphs.";

const FREE_INSTRUCTION: &str = "Mode: free. Keep the response short and validating, \
     no more than a few sentences. Offer one simple coping idea. End by gently mentioning \
     that premium mode offers deeper, longer conversations.";

const BASE_PERSONA: &str = "You are Solace, a compassionate mental-health support companion. \
     You are not a therapist and never diagnose or prescribe. Listen carefully, validate \
     feelings, and encourage professional help when appropriate.";

/// Instruction fragment for the account tier.
pub fn mode_instruction(is_premium: bool) -> &'static str {
    if is_premium {
        PREMIUM_INSTRUCTION
    } else {
        FREE_INSTRUCTION
    }
}

/// Default token ceiling for the account tier.
pub fn max_tokens(is_premium: bool) -> u32 {
    TokenCeilings::default().max_tokens(is_premium)
}

/// Configurable output ceilings. Premium must exceed free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCeilings {
    pub premium: u32,
    pub free: u32,
}

impl Default for TokenCeilings {
    fn default() -> Self {
        Self {
            premium: PREMIUM_MAX_TOKENS,
            free: FREE_MAX_TOKENS,
        }
    }
}

impl From<&ModesConfig> for TokenCeilings {
    fn from(cfg: &ModesConfig) -> Self {
        if cfg.premium_max_tokens > cfg.free_max_tokens {
            Self {
                premium: cfg.premium_max_tokens,
                free: cfg.free_max_tokens,
            }
        } else {
            tracing::warn!(
                "premiumMaxTokens ({}) does not exceed freeMaxTokens ({}); using defaults",
                cfg.premium_max_tokens,
                cfg.free_max_tokens
            );
            Self::default()
        }
    }
}

impl TokenCeilings {
    pub fn max_tokens(&self, is_premium: bool) -> u32 {
        if is_premium {
            self.premium
        } else {
            self.free
        }
    }
}

/// Everything the provider call needs, derived from language, case and tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDecision {
    pub is_premium: bool,
    pub max_tokens: u32,
    pub instruction_text: String,
    pub language: Language,
    pub case_type: CaseType,
}

/// Join persona, language, case and mode fragments into one system instruction.
pub fn compose_instructions(
    language: Language,
    case_type: CaseType,
    is_premium: bool,
    ceilings: TokenCeilings,
) -> ModeDecision {
    let today = chrono::Utc::now().format("%Y-%m-%d");
    let instruction_text = format!(
        "{}\n\n{}\n\n{}\n\n{}\n\nToday's date: {}",
        BASE_PERSONA,
        language.instruction(),
        case_type.instruction(),
        mode_instruction(is_premium),
        today
    );
    ModeDecision {
        is_premium,
        max_tokens: ceilings.max_tokens(is_premium),
        instruction_text,
        language,
        case_type,
    }
}
