//! Request adapter: conversation history to a `generateContent` request.
//!
//! The Maps grounding tool is always declared. A known position is attached
//! as retrieval bias; without one the tool is declared with no bias and the
//! provider decides what location context to use.

use serde::{Deserialize, Serialize};

use geoguide_core::types::{Coordinates, Message, Role};

// =============================================================================
// Wire types
// =============================================================================

/// Body of `POST models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

/// Provider-side turn labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    User,
    Model,
}

impl From<Role> for ModelRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ModelRole::User,
            Role::Assistant => ModelRole::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: ModelRole,
    pub parts: Vec<TextPart>,
}

impl Content {
    pub fn text(role: ModelRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_maps: GoogleMaps,
}

/// Enables Google Maps grounding. Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleMaps {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for LatLng {
    fn from(c: Coordinates) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

// =============================================================================
// Grounding configuration
// =============================================================================

/// Maps grounding settings for one request. The tool itself is always on;
/// only the retrieval bias is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundingConfig {
    pub bias: Option<Coordinates>,
}

impl GroundingConfig {
    pub fn new(bias: Option<Coordinates>) -> Self {
        Self { bias }
    }

    pub fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            google_maps: GoogleMaps::default(),
        }]
    }

    pub fn tool_config(&self) -> Option<ToolConfig> {
        self.bias.map(|coords| ToolConfig {
            retrieval_config: RetrievalConfig {
                lat_lng: coords.into(),
            },
        })
    }
}

// =============================================================================
// RequestAdapter
// =============================================================================

/// Builds provider requests from the transcript.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestAdapter {
    /// Replay at most this many prior messages. `None` replays everything.
    pub max_turns: Option<usize>,
}

impl RequestAdapter {
    pub fn new(max_turns: Option<usize>) -> Self {
        Self { max_turns }
    }

    /// Build a request from prior messages plus the new user utterance.
    pub fn build(
        &self,
        history: &[Message],
        new_text: &str,
        location: Option<Coordinates>,
    ) -> GenerateContentRequest {
        let start = match self.max_turns {
            Some(limit) => history.len().saturating_sub(limit),
            None => 0,
        };

        let mut contents: Vec<Content> = history[start..]
            .iter()
            .map(|msg| Content::text(msg.role.into(), msg.text.clone()))
            .collect();
        contents.push(Content::text(ModelRole::User, new_text));

        let grounding = GroundingConfig::new(location);
        GenerateContentRequest {
            contents,
            tools: grounding.tools(),
            tool_config: grounding.tool_config(),
        }
    }
}

/// Build a request replaying the full history.
pub fn build_request(
    history: &[Message],
    new_text: &str,
    location: Option<Coordinates>,
) -> GenerateContentRequest {
    RequestAdapter::default().build(history, new_text, location)
}

// =============================================================================
// Tests
// =============================================================================
