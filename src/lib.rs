//! cover-guard: notices when the tracks of an album carry different embedded
//! front covers.
//!
//! The core is [`tracker::CoverTracker`], a host-driven state machine fed
//! with file-added, debounce-elapsed and album-removed events. The remaining
//! modules supply the production collaborators around it: cover extraction
//! ([`cover`]), library discovery and watching ([`scanner`]), presentation
//! ([`report`]), an async host loop ([`service`]) and the CLI ([`cli`]).

pub mod cli;
pub mod config;
pub mod cover;
pub mod error;
pub mod report;
pub mod scanner;
pub mod service;
#[cfg(test)]
pub mod test_utils;
pub mod tracker;
