pub mod db;
pub mod error;
pub mod operations;
pub mod report;
pub(crate) mod schema;
