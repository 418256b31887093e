pub mod manager;
pub mod migrate;
pub mod models;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
