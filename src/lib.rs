pub mod app;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod output;
pub mod store;
pub mod verify;
