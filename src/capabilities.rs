//! Host capability queries
//!
//! Optional client features (speech recognition, clipboard) may be missing.
//! The core asks before relying on them and degrades when they are absent.

use serde::Serialize;

/// Capability query interface
pub trait Capabilities: Send + Sync {
    fn supports_voice_input(&self) -> bool;

    fn supports_clipboard(&self) -> bool;
}

/// Capabilities fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StaticCapabilities {
    pub voice_input: bool,
    pub clipboard: bool,
}

impl Capabilities for StaticCapabilities {
    fn supports_voice_input(&self) -> bool {
        self.voice_input
    }

    fn supports_clipboard(&self) -> bool {
        self.clipboard
    }
}

/// Serializable view of any capability source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    pub voice_input: bool,
    pub clipboard: bool,
}

impl CapabilityReport {
    pub fn from_capabilities(capabilities: &dyn Capabilities) -> Self {
        Self {
            voice_input: capabilities.supports_voice_input(),
            clipboard: capabilities.supports_clipboard(),
        }
    }
}
