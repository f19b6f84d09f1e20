//! Service layer
//!
//! Contains the operations callers use, separated from storage details.

mod feed;

pub use feed::{Clock, FeedService};
