use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GeoguideError, Result};

// =============================================================================
// Enums
// =============================================================================

/// Author of a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Typed by the person chatting.
    User,
    /// Produced from a model reply (or a fixed fallback/apology).
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of the one-shot location lookup.
///
/// Starts at `Connecting` and moves to exactly one terminal state per session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Denied,
    Error,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConnectionState::Connecting)
    }

    /// Short status label shown next to the chat header.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Locating...",
            ConnectionState::Connected => "GPS active",
            ConnectionState::Denied | ConnectionState::Error => "No location",
        }
    }
}

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Unique identifier for a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Location
// =============================================================================

/// A WGS84 position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coords = Self {
            latitude,
            longitude,
        };
        if coords.is_valid() {
            Ok(coords)
        } else {
            Err(GeoguideError::Input(format!(
                "coordinates out of range: ({}, {})",
                latitude, longitude
            )))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// =============================================================================
// Grounding
// =============================================================================

/// A web page the model consulted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebCitation {
    pub uri: String,
    pub title: String,
}

/// An excerpt from a user review of a place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSnippet {
    pub content: String,
    pub author: String,
}

/// A physical place or business the model consulted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCitation {
    /// Opaque identifier assigned by the provider.
    pub source_id: String,
    pub title: String,
    /// Map link for the place.
    pub uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_snippets: Vec<ReviewSnippet>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Citation {
    Web(WebCitation),
    Place(PlaceCitation),
}

impl Citation {
    pub fn as_place(&self) -> Option<&PlaceCitation> {
        match self {
            Citation::Place(place) => Some(place),
            Citation::Web(_) => None,
        }
    }

    pub fn as_web(&self) -> Option<&WebCitation> {
        match self {
            Citation::Web(web) => Some(web),
            Citation::Place(_) => None,
        }
    }
}

/// Citations attached to a model reply, in provider order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingResult {
    #[serde(default)]
    pub citations: Vec<Citation>,
    /// Search queries the model issued while grounding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
}

impl GroundingResult {
    pub fn places(&self) -> impl Iterator<Item = &PlaceCitation> {
        self.citations.iter().filter_map(Citation::as_place)
    }

    pub fn web_sources(&self) -> impl Iterator<Item = &WebCitation> {
        self.citations.iter().filter_map(Citation::as_web)
    }

}

/// Normalized model answer: text plus optional grounding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub text: String,
    #[serde(
        default,
        rename = "groundingMetadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub grounding: Option<GroundingResult>,
}

// =============================================================================
// Messages
// =============================================================================

/// One entry of the conversation transcript. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<GroundingResult>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
            grounding: None,
        }
    }

    pub fn assistant(text: impl Into<String>, grounding: Option<GroundingResult>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            text: text.into(),
            created_at: Utc::now(),
            grounding,
        }
    }

    pub fn from_reply(reply: Reply) -> Self {
        Self::assistant(reply.text, reply.grounding)
    }
}

// =============================================================================
// Search endpoint bodies
// =============================================================================

/// A prior turn replayed to the search endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

impl From<&Message> for HistoryEntry {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            text: msg.text.clone(),
        }
    }
}

impl From<HistoryEntry> for Message {
    fn from(entry: HistoryEntry) -> Self {
        match entry.role {
            Role::User => Message::user(entry.text),
            Role::Assistant => Message::assistant(entry.text, None),
        }
    }
}

/// Body of `POST /api/search`.
///
/// `prompt` is optional at the type level so a missing prompt can be reported
/// as a 400 instead of a deserialization failure. A `location` that does not
/// parse as coordinates is read as `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_location",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

fn lenient_location<'de, D>(deserializer: D) -> std::result::Result<Option<Coordinates>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(coords) => Ok(Some(coords)),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed location");
            Ok(None)
        }
    }
}

/// Error body returned by the search endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Tests
// =============================================================================
