//! Display models for the transcript.
//!
//! Turns messages into line-split bubbles with a short time label and, for
//! assistant replies, one card per cited place.

use chrono::{DateTime, Local, Utc};

use geoguide_core::types::{Message, MessageId, Role};

/// Card shown under an assistant reply for each cited place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCard {
    pub title: String,
    pub uri: String,
    pub icon: &'static str,
}

pub const PLACE_CARD_ICON: &str = "map-pin";

/// One rendered chat bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub lines: Vec<String>,
    pub time_label: String,
    pub place_cards: Vec<PlaceCard>,
}

impl MessageView {
    pub fn from_message(message: &Message) -> Self {
        let place_cards = match (message.role, &message.grounding) {
            (Role::Assistant, Some(grounding)) => grounding
                .places()
                .map(|place| PlaceCard {
                    title: place.title.clone(),
                    uri: place.uri.clone(),
                    icon: PLACE_CARD_ICON,
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            id: message.id,
            role: message.role,
            lines: message.text.split('\n').map(str::to_string).collect(),
            time_label: time_label(message.created_at),
            place_cards,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Local wall-clock time as `HH:MM`.
pub fn time_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn render(messages: &[Message]) -> Vec<MessageView> {
    messages.iter().map(MessageView::from_message).collect()
}

/// Plain-text rendering for terminals.
pub fn render_text(view: &MessageView) -> String {
    let speaker = match view.role {
        Role::User => "you",
        Role::Assistant => "guide",
    };
    let mut out = format!("[{}] {}:", view.time_label, speaker);
    for line in &view.lines {
        out.push_str("\n  ");
        out.push_str(line);
    }
    for card in &view.place_cards {
        out.push_str(&format!("\n  * {} <{}>", card.title, card.uri));
    }
    out
}
