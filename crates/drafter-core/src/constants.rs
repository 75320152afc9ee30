/// Store collection holding draft documents
pub const DRAFT_COLLECTION: &str = "drafts";

pub const APP_NAME: &str = "drafter";
pub const USER_AGENT: &str = const_str::concat!(APP_NAME, "/", env!("CARGO_PKG_VERSION"));

/// Anchored item type that routes a turn into the update path
pub const ANCHOR_TYPE_DRAFT: &str = "draft";
