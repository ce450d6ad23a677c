//! Service configuration from the environment

use crate::capabilities::StaticCapabilities;
use std::str::FromStr;
use std::time::Duration;

/// Pre-registered account for local use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
}

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub reply_timeout: Duration,
    pub min_latency: Duration,
    pub max_latency: Duration,
    pub capabilities: StaticCapabilities,
    pub session_ttl: Duration,
    pub demo_account: Option<DemoAccount>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            reply_timeout: Duration::from_secs(30),
            min_latency: Duration::from_millis(1000),
            max_latency: Duration::from_millis(3000),
            capabilities: StaticCapabilities {
                voice_input: false,
                clipboard: true,
            },
            session_ttl: Duration::from_secs(60 * 60),
            demo_account: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable keys keep their default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            port: parse_or(get("CHATBOT_PORT"), "CHATBOT_PORT", defaults.port),
            reply_timeout: Duration::from_secs(parse_positive_or(
                get("CHATBOT_REPLY_TIMEOUT_SECS"),
                "CHATBOT_REPLY_TIMEOUT_SECS",
                defaults.reply_timeout.as_secs(),
            )),
            min_latency: Duration::from_millis(parse_or(
                get("CHATBOT_MIN_LATENCY_MS"),
                "CHATBOT_MIN_LATENCY_MS",
                1000,
            )),
            max_latency: Duration::from_millis(parse_or(
                get("CHATBOT_MAX_LATENCY_MS"),
                "CHATBOT_MAX_LATENCY_MS",
                3000,
            )),
            capabilities: StaticCapabilities {
                voice_input: parse_flag(
                    get("CHATBOT_VOICE_INPUT"),
                    "CHATBOT_VOICE_INPUT",
                    defaults.capabilities.voice_input,
                ),
                clipboard: parse_flag(
                    get("CHATBOT_CLIPBOARD"),
                    "CHATBOT_CLIPBOARD",
                    defaults.capabilities.clipboard,
                ),
            },
            session_ttl: Duration::from_secs(parse_or(
                get("CHATBOT_SESSION_TTL_SECS"),
                "CHATBOT_SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )),
            demo_account: get("CHATBOT_DEMO_ACCOUNT").and_then(|value| parse_account(&value)),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

/// Like [`parse_or`], but zero also keeps the default
fn parse_positive_or(value: Option<String>, key: &str, default: u64) -> u64 {
    match parse_or(value, key, default) {
        0 => {
            tracing::warn!(key, "Ignoring zero setting");
            default
        }
        parsed => parsed,
    }
}

fn parse_flag(value: Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable flag");
            default
        }
    }
}

/// `email:password`; the password may itself contain colons
fn parse_account(value: &str) -> Option<DemoAccount> {
    match value.split_once(':') {
        Some((email, password)) if !email.trim().is_empty() && !password.is_empty() => {
            Some(DemoAccount {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
        }
        _ => {
            tracing::warn!("CHATBOT_DEMO_ACCOUNT must look like email:password, ignoring");
            None
        }
    }
}
