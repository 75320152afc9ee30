//! Draft lifecycle and conversational-update engine.
//!
//! ## Module Organization
//!
//! - `contact`: Contact directory seam and free-text recipient resolution
//! - `conversation`: Conversation turn types shared by the oracle and router
//! - `delivery`: Delivery provider seam and draft-to-parameter conversion
//! - `draft`: Draft service, field updates, completeness rules, content fallback
//! - `oracle`: Oracle seam, prompt contracts, and response normalization
//! - `router`: Per-turn routing between draft handling and pass-through

pub mod contact;
pub mod conversation;
pub mod delivery;
pub mod draft;
pub mod error;
pub mod oracle;
pub mod router;
