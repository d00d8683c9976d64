//! Presentation layer.
//!
//! View models own only ephemeral state (field values, busy flags, status
//! lines) and render to plain text. Every failure from the layers below is
//! caught here and turned into a status line.

pub mod card;
pub mod form;
pub mod format;
pub mod list;
pub mod notice;

pub use card::TokenCard;
pub use form::{FormStatus, TokenCreationForm};
pub use list::TokenListView;
pub use notice::NoticeBoard;
