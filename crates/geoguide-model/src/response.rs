//! Response extractor: `generateContent` envelope to text plus citations.

use serde::{Deserialize, Serialize};

use geoguide_core::types::{
    Citation, GroundingResult, PlaceCitation, Reply, ReviewSnippet, WebCitation,
};

/// Reply text used when the model returns no answer.
pub const NO_INFORMATION_FOUND: &str = "No information found.";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A content part. Only text parts contribute to the reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default)]
    pub grounding_supports: Vec<serde_json::Value>,
    #[serde(default)]
    pub web_search_queries: Vec<String>,
}

/// One grounding source. Per the provider contract either field, both, or
/// neither may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapsChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsChunk {
    #[serde(default, alias = "placeId")]
    pub source_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_answer_sources: Option<OneOrMany<PlaceAnswerSources>>,
}

/// The provider has sent `placeAnswerSources` both as an object and as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAnswerSources {
    #[serde(default)]
    pub review_snippets: Vec<WireReviewSnippet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReviewSnippet {
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "author")]
    pub review_author: String,
}

// =============================================================================
// Conversion
// =============================================================================

impl From<GroundingMetadata> for GroundingResult {
    fn from(meta: GroundingMetadata) -> Self {
        let mut citations = Vec::new();
        for chunk in meta.grounding_chunks {
            if let Some(web) = chunk.web {
                citations.push(Citation::Web(WebCitation {
                    uri: web.uri,
                    title: web.title,
                }));
            }
            if let Some(maps) = chunk.maps {
                citations.push(Citation::Place(maps.into()));
            }
        }
        GroundingResult {
            citations,
            queries: meta.web_search_queries,
        }
    }
}

impl From<MapsChunk> for PlaceCitation {
    fn from(maps: MapsChunk) -> Self {
        let review_snippets = maps
            .place_answer_sources
            .as_ref()
            .map(|sources| {
                sources
                    .as_slice()
                    .iter()
                    .flat_map(|s| s.review_snippets.iter())
                    .map(|r| ReviewSnippet {
                        content: r.content.clone(),
                        author: r.review_author.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        PlaceCitation {
            source_id: maps.source_id,
            title: maps.title,
            uri: maps.uri,
            review_snippets,
        }
    }
}

// =============================================================================
// ResponseExtractor
// =============================================================================

/// Normalizes provider responses into [`Reply`] values.
#[derive(Debug, Clone)]
pub struct ResponseExtractor {
    /// Text used when there is no candidate or it carries no text.
    pub fallback_text: String,
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new(NO_INFORMATION_FOUND)
    }
}

impl ResponseExtractor {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self {
            fallback_text: fallback_text.into(),
        }
    }

    /// Extract the reply from the first candidate.
    ///
    /// A missing answer is not an error: the fallback text is substituted.
    pub fn extract(&self, response: GenerateContentResponse) -> Reply {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Reply {
                text: self.fallback_text.clone(),
                grounding: None,
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Reply {
            text: if text.is_empty() {
                self.fallback_text.clone()
            } else {
                text
            },
            grounding: candidate.grounding_metadata.map(GroundingResult::from),
        }
    }
}

/// Extract a reply using the default fallback text.
pub fn extract_reply(response: GenerateContentResponse) -> Reply {
    ResponseExtractor::default().extract(response)
}

// =============================================================================
// Tests
// =============================================================================
