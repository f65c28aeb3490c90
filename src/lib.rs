//! mpris-pilot: launch and remote-control MPRIS2 media players over the
//! D-Bus session bus.
//!
//! ```rust,no_run
//! use mpris_pilot::{config::Config, services::MprisClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MprisClient::new(Config::load_default()?)?;
//! let session = client.start("vlc", None).await?;
//!
//! session.player().open_uri("file:///tmp/movie.mp4").await?;
//! session.player().play().await?;
//! session.stop(false).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

/// Configuration schema, loading and validation.
pub mod config;

/// Player services.
pub mod services;

/// Logging setup.
pub mod tracing_config;
