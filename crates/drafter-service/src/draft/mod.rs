//! Draft lifecycle.
//!
//! ## Module Organization
//!
//! - `content`: Fallback extraction of proposed content from assistant turns
//! - `fields`: Typed partial updates
//! - `merge`: Applying updates to payloads
//! - `service`: Create, update, close and deliver operations over the store
//! - `summary`: Draft context handed to the oracle
//! - `validate`: Per-type completeness rules

pub mod content;
pub mod fields;
pub mod merge;
pub mod service;
pub mod summary;
pub mod validate;

pub use content::{ContentResolver, HeuristicContentResolver};
pub use fields::{FieldUpdates, ListMode};
pub use service::{CreateOutcome, DraftService};
pub use validate::Completeness;
