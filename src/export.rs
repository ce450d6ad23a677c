//! Conversation export
//!
//! Pure renderings of a transcript as plain text or JSON. Delivering the
//! bytes (download, file) is up to the caller.

use crate::transcript::{Message, Sender};
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

const TEXT_HEADER: &str = "ChatBot AI - Conversation Export";
const SEPARATOR_WIDTH: usize = 50;

/// en-US style `M/D/YYYY, h:mm:ss AM`
const LOCALIZED_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain;charset=utf-8",
            ExportFormat::Json => "application/json;charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unknown export format: {other}")),
        }
    }
}

/// JSON export document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: String,
    pub message_count: usize,
    pub messages: Vec<ExportedMessage>,
}

/// One message in the JSON export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: String,
}

impl From<&Message> for ExportedMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            content: message.content.clone(),
            sender: message.sender,
            timestamp: iso_timestamp(&message.timestamp),
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn iso_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn localized<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format(LOCALIZED_FORMAT).to_string()
}

/// Render the plain-text export, with times shown in `tz`
pub fn render_text<Tz: TimeZone>(messages: &[Message], exported_at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let header = format!(
        "{TEXT_HEADER}\nExported on: {}\n{}\n\n",
        localized(&exported_at, tz),
        "=".repeat(SEPARATOR_WIDTH)
    );

    let body = messages
        .iter()
        .map(|message| {
            format!(
                "[{}] {}: {}",
                localized(&message.timestamp, tz),
                message.sender.display_name(),
                message.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    header + &body
}

/// Build the JSON export document
pub fn export_document(messages: &[Message], exported_at: DateTime<Utc>) -> ExportDocument {
    ExportDocument {
        export_date: iso_timestamp(&exported_at),
        message_count: messages.len(),
        messages: messages.iter().map(ExportedMessage::from).collect(),
    }
}

/// Render the JSON export, pretty-printed with two-space indentation
pub fn render_json(
    messages: &[Message],
    exported_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export_document(messages, exported_at))
}

/// `chat-export-YYYY-MM-DD.<ext>`
pub fn default_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "chat-export-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}
