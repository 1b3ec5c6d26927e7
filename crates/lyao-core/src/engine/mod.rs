pub mod archive;
pub mod command;
pub mod config;
pub mod error;
pub mod progress;
pub mod shadow;
pub mod transport;
