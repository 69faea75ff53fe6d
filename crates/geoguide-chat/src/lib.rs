//! Conversational client for GeoGuide.
//!
//! Keeps the session transcript, probes for a position once, gates
//! submissions to one in-flight request, and renders messages with their
//! place cards.

pub mod backend;
pub mod error;
pub mod location;
pub mod session;
pub mod store;
pub mod view;

pub use backend::{ChatBackend, DirectBackend, HttpBackend};
pub use error::ChatError;
pub use location::{
    acquire_location, provider_from_config, FixedLocation, LocationError, LocationProvider,
    LocationStatus, NoLocation, PositionOptions, UnusableLocation,
};
pub use session::{ChatSession, SubmitOutcome};
pub use store::ConversationStore;
pub use view::{render, render_text, MessageView, PlaceCard};
