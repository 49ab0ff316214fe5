//! Bot and crawler filtering

use super::{handler_fn, BoxHandler, Middleware};
use crate::error::{ContactError, HttpError, Result};
use crate::event::ProxyEvent;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// One regex per line; blank lines and `#` comments are skipped
const BOT_PATTERNS: &str = include_str!("bot_patterns.txt");

/// Fragments that contain a signature but belong to real browsers or devices
const BOT_EXCLUSIONS: &[&str] = &[
    "cubot",
    "libhttp",
    "hmscore",
    "gmscore",
    "gnews",
    "channel/google",
    "google/google",
    "googleapp",
    "google pixel",
];

fn builtin_patterns<'a>() -> impl Iterator<Item = &'a str> {
    BOT_PATTERNS
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Classifies user agents against a signature set
#[derive(Debug, Clone)]
pub struct BotFilter {
    signatures: Regex,
    exclusions: Regex,
}

impl BotFilter {
    /// Filter with the built-in signature set
    pub fn new() -> Self {
        Self::with_extra_patterns(&[]).expect("built-in bot signatures are valid")
    }

    /// Filter with the built-in signatures plus `extra` regex fragments
    pub fn with_extra_patterns(extra: &[String]) -> Result<Self> {
        let signatures = builtin_patterns()
            .chain(extra.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            signatures: compile(&signatures)?,
            exclusions: compile(&BOT_EXCLUSIONS.join("|"))?,
        })
    }

    /// A missing or blank user agent is not treated as a bot
    pub fn is_bot(&self, user_agent: Option<&str>) -> bool {
        let Some(user_agent) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return false;
        };
        let cleaned = self.exclusions.replace_all(user_agent, "");
        self.signatures.is_match(&cleaned)
    }

    /// Fail with `NO_BOTS_ALLOWED` (401) when the event comes from a bot
    pub fn check(&self, event: &ProxyEvent) -> Result<()> {
        let user_agent = event.header("user-agent");
        if self.is_bot(user_agent) {
            warn!("Rejected bot user agent: {}", user_agent.unwrap_or_default());
            return Err(HttpError::no_bots_allowed().into());
        }
        debug!("User agent passed bot filter");
        Ok(())
    }

    /// Middleware rejecting bots before `inner` runs
    pub fn layer(self: Arc<Self>) -> Middleware {
        Box::new(move |inner: BoxHandler| {
            let filter = self.clone();
            handler_fn(move |event: ProxyEvent| {
                let filter = filter.clone();
                let inner = inner.clone();
                async move {
                    filter.check(&event)?;
                    inner.handle(event).await
                }
            })
        })
    }
}

impl Default for BotFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){}", pattern))
        .map_err(|e| ContactError::Config(format!("Invalid bot pattern: {}", e)))
}

/// Middleware using the built-in signature set
pub fn block_bots(inner: BoxHandler) -> BoxHandler {
    static DEFAULT_FILTER: OnceLock<Arc<BotFilter>> = OnceLock::new();
    let filter = DEFAULT_FILTER.get_or_init(|| Arc::new(BotFilter::new())).clone();
    filter.layer()(inner)
}
