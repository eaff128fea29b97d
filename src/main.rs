use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod ingest;
pub mod sources;
pub mod storage;
mod summary;

fn main() {
    run();
}
