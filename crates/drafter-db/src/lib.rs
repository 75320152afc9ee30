//! Draft persistence: the document store seam and the draft record model.

pub mod db;
pub mod error;
pub mod model;
