pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgDocumentStore;
