//! Notice board watcher.
//!
//! Polls a notice page once per invocation, announces new notices to a
//! Telegram chat, and escalates sustained failures using the ledger from
//! the `coordination` crate.

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod fetcher;
pub mod messages;
pub mod notifier;
pub mod orchestrator;
pub mod parser;
pub mod runner;
pub mod summary;

pub use config::{FileConfig, WatchConfig};
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use notifier::{Message, Notifier, TelegramNotifier};
pub use orchestrator::{CycleReport, Orchestrator};
pub use parser::{NoticeParser, TableParser};
pub use runner::RunnerContext;
