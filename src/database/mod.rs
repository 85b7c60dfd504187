// Database module
// Persistent vector collection backed by LanceDB

pub mod lancedb;

pub use self::lancedb::{QuoteCollection, QuoteMatch, QuoteRecord};
