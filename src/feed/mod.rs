//! Feed engine
//!
//! - `cursor`: opaque page tokens
//! - `tags`: hashtag extraction from post bodies
//! - `query`: candidate-set queries for each feed variant
//! - `pagination`: keyset bounds, overfetch and next-cursor derivation

pub mod cursor;
pub mod pagination;
pub mod query;
pub mod tags;

pub use cursor::Cursor;
pub use pagination::{Page, resolve_page_size};
pub use query::{FeedKind, FeedQuery};
