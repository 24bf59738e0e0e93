pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod playlist;
pub mod recents;
pub mod service;
pub mod upstream;
pub mod web;
