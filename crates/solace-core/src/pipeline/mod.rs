//! Per-message decision pipeline.
//!
//! Rate limiter, then input normalizer, then crisis classifier. A crisis
//! stops the pipeline with the fixed safety payload. Otherwise the language
//! resolver and case/mode selector produce the instruction bundle for the
//! provider call.

pub mod case;
pub mod crisis;
pub mod input;
pub mod language;
pub mod mode;
pub mod rate_limit;

use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::util::truncate_string;

pub use case::CaseType;
pub use crisis::{CrisisCheck, CrisisResponse};
pub use input::{InputError, Validation};
pub use language::Language;
pub use mode::{ModeDecision, TokenCeilings};
pub use rate_limit::{RateDecision, RateLimiter};

/// What the caller should do with an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Too many requests from this caller in the current window.
    RateLimited,
    /// Input was malformed; nothing else ran.
    Invalid(InputError),
    /// Crisis vocabulary found; reply with this payload and stop.
    Crisis(CrisisResponse),
    /// Hand the instruction bundle to the provider.
    Proceed(ModeDecision),
}

/// The decision pipeline. Cheap to clone; clones share rate-limit state.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    limiter: RateLimiter,
    ceilings: TokenCeilings,
}

impl Pipeline {
    pub fn new(limiter: RateLimiter, ceilings: TokenCeilings) -> Self {
        Self { limiter, ceilings }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            RateLimiter::from_config(&cfg.limits),
            TokenCeilings::from(&cfg.modes),
        )
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run the pipeline on a single free-form text value.
    pub fn process_text(
        &self,
        caller_key: &str,
        text: Option<&Value>,
        language_hint: Option<&str>,
        is_premium: bool,
    ) -> PipelineOutcome {
        if self.limiter.should_limit(caller_key) {
            return PipelineOutcome::RateLimited;
        }
        match input::validate_value(text) {
            Validation::Valid(text) => self.evaluate(&text, language_hint, is_premium),
            Validation::Invalid(e) => PipelineOutcome::Invalid(e),
        }
    }

    /// Run the pipeline on a conversation; its last user message is analysed.
    pub fn process_conversation(
        &self,
        caller_key: &str,
        messages: Option<&Value>,
        language_hint: Option<&str>,
        is_premium: bool,
    ) -> PipelineOutcome {
        if self.limiter.should_limit(caller_key) {
            return PipelineOutcome::RateLimited;
        }
        match input::validate_conversation(messages) {
            Validation::Valid(text) => self.evaluate(&text, language_hint, is_premium),
            Validation::Invalid(e) => PipelineOutcome::Invalid(e),
        }
    }

    /// Crisis, language and case/mode stages on already-normalized text.
    /// Does not count against the rate limit.
    pub fn evaluate(&self, text: &str, language_hint: Option<&str>, is_premium: bool) -> PipelineOutcome {
        if let CrisisCheck::Crisis(response) = crisis::check_text(text) {
            return PipelineOutcome::Crisis(response);
        }

        let language = language::resolve(language_hint, text);
        let case_type = case::detect_case_type(text);
        debug!(
            "Pipeline decision: language={}, case={}, premium={}, text={}",
            language,
            case_type,
            is_premium,
            truncate_string(text, 40, "...")
        );

        PipelineOutcome::Proceed(mode::compose_instructions(
            language,
            case_type,
            is_premium,
            self.ceilings,
        ))
    }
}
