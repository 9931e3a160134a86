//! # Announcerd - Periodic Announcement Broadcaster
//!
//! Announcerd periodically selects one announcement out of a pool drawn from
//! three sources and hands it to a dispatcher for delivery:
//!
//! - **Static catalog**: read-only announcements from `config.toml`.
//! - **Permanent entries**: added at runtime, persisted, live until deleted.
//! - **Temporary entries**: added at runtime with a finite number of
//!   emissions left; removed automatically once spent.
//!
//! Selection runs in round-robin order with a rotation cursor, or uniformly
//! at random. Runtime entries survive restarts via two small JSON documents
//! on disk, written atomically on every mutation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use announcerd::announcer::{Announcer, MessageStore};
//! use announcerd::config::Config;
//! use announcerd::dispatch::{DeliveryOptions, LogDispatcher};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::sync::Mutex;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_init("config.toml").await?;
//!     let store = MessageStore::load(&config.storage.data_dir)?;
//!     let options = DeliveryOptions {
//!         prefix: config.settings.prefix.clone(),
//!         use_prefix: config.settings.use_prefix,
//!     };
//!     let interval = Duration::from_secs(config.settings.interval_seconds);
//!     let announcer = Arc::new(Mutex::new(Announcer::new(&config, store)));
//!     announcerd::service::run(announcer, LogDispatcher, interval, options).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`announcer`] - Pool management, selection engine, persisted store
//! - [`config`] - Configuration loading, defaults, and version migration
//! - [`dispatch`] - Delivery boundary and the built-in log dispatcher
//! - [`service`] - The scheduler loop driving periodic emission
//! - [`logutil`] - Single-line log escaping for announcement text

pub mod announcer;
pub mod config;
pub mod dispatch;
pub mod logutil;
pub mod service;
