//! Browser chat page.
//!
//! A single self-contained HTML file, CSS and JavaScript inlined, embedded at
//! compile time. It asks the browser for one position fix, keeps the
//! transcript client-side, posts each turn with its history to
//! `/api/search`, and shows a card per cited place.

pub const CHAT_PAGE_HTML: &str = include_str!("../assets/chat.html");
