pub mod config;
pub mod seed;
pub mod server;
pub mod service;
