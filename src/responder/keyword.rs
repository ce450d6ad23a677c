//! Keyword-matching stub responder
//!
//! Matches the lowercased input against a fixed keyword table, first match
//! wins, in the order of [`KEYWORD_PRIORITY`]. Without a match a random
//! entry of [`DEFAULT_REPLIES`] is returned.

use super::{Responder, ResponderError};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// Keyword lookup order
pub const KEYWORD_PRIORITY: [&str; 8] = [
    "hello", "help", "weather", "time", "date", "name", "thanks", "bye",
];

/// Replies used when no keyword matches
pub const DEFAULT_REPLIES: [&str; 8] = [
    "That's an interesting question! Can you tell me more about what you're looking for?",
    "I understand what you're asking. Let me think about the best way to help you with that.",
    "Thanks for sharing that with me. Here's what I think might be helpful...",
    "That's a great question! While I don't have all the details, I can suggest a few approaches.",
    "I appreciate you asking! Based on what you've told me, here are some thoughts...",
    "Interesting! I'd love to help you explore that topic further.",
    "That's something I find fascinating too! What specific aspect interests you most?",
    "Great question! There are several ways to think about this...",
];

const DEFAULT_MIN_LATENCY: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_LATENCY: Duration = Duration::from_millis(3000);

/// Canned reply for a keyword
fn keyword_reply<Tz: TimeZone>(keyword: &str, now: &DateTime<Tz>) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let reply = match keyword {
        "hello" => "Hello! I'm your AI assistant. How can I help you today?".to_string(),
        "help" => "I'm here to assist you with any questions or tasks you might have. Feel free to ask me anything!".to_string(),
        "weather" => "I'd love to help with weather information, but I don't have access to real-time weather data. You might want to check a weather service for current conditions.".to_string(),
        "time" => format!("The current time is {}.", now.format("%-I:%M:%S %p")),
        "date" => format!("Today's date is {}.", now.format("%-m/%-d/%Y")),
        "name" => "I'm ChatBot AI, your friendly virtual assistant!".to_string(),
        "thanks" => "You're very welcome! I'm happy to help.".to_string(),
        "bye" => "Goodbye! It was great chatting with you. Feel free to come back anytime!".to_string(),
        _ => return None,
    };
    Some(reply)
}

/// First keyword from [`KEYWORD_PRIORITY`] contained in `text`, ignoring case
pub fn matched_keyword(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    KEYWORD_PRIORITY
        .iter()
        .copied()
        .find(|keyword| lower.contains(keyword))
}

/// Reply for `text` at instant `now`, if a keyword matches
pub fn keyword_reply_for<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    matched_keyword(text).and_then(|keyword| keyword_reply(keyword, now))
}

/// Keyword stub with simulated latency
#[derive(Debug, Clone)]
pub struct KeywordResponder {
    min_latency: Duration,
    max_latency: Duration,
}

impl Default for KeywordResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordResponder {
    pub fn new() -> Self {
        Self {
            min_latency: DEFAULT_MIN_LATENCY,
            max_latency: DEFAULT_MAX_LATENCY,
        }
    }

    /// Set the simulated latency range; bounds are swapped if reversed
    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min.min(max);
        self.max_latency = min.max(max);
        self
    }

    fn sample_latency(&self) -> Duration {
        if self.min_latency == self.max_latency {
            return self.min_latency;
        }
        rand::thread_rng().gen_range(self.min_latency..=self.max_latency)
    }

    fn compose(text: &str) -> String {
        keyword_reply_for(text, &Local::now()).unwrap_or_else(|| {
            DEFAULT_REPLIES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(DEFAULT_REPLIES[0])
                .to_string()
        })
    }
}

#[async_trait]
impl Responder for KeywordResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponderError> {
        let latency = self.sample_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(Self::compose(text))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
