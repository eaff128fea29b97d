use std::path::Path;

use chrono::{Local, NaiveDate};
use rusqlite::Connection;

use crate::{
    config::Database,
    storage::{error::StorageError, schema},
};

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open(path)
}

/// Opens the configured database and makes sure the schema exists
pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = match config {
        Database::InMemory => open_in_memory()?,
        Database::File { path } => open_from_file(path)?,
    };
    schema::init(&db)?;
    Ok(db)
}

/// Chart dates are stored as ISO `YYYY-MM-DD` text
pub fn chart_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
