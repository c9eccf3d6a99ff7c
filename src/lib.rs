pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod reporting;
pub mod summary;
