pub mod config;
pub mod console;
pub mod error;
pub mod locator;
pub mod migration;
pub mod paths;
pub mod platform;
pub mod prompt;
pub mod retry;
pub mod runner;
