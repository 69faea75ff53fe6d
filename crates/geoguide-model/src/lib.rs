//! Maps-grounded Gemini access for GeoGuide.
//!
//! Shapes conversation history into `generateContent` requests with the
//! Google Maps grounding tool, sends them, and normalizes the response into
//! reply text plus web and place citations.

pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod search;

pub use client::{GeminiClient, GenerativeModel};
pub use error::ModelError;
pub use request::{build_request, GenerateContentRequest, GroundingConfig, RequestAdapter};
pub use response::{
    extract_reply, GenerateContentResponse, ResponseExtractor, NO_INFORMATION_FOUND,
};
pub use search::GroundedSearch;
