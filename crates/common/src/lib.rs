//! Common utilities and shared types for TAISEN.
//!
//! This crate provides foundational components used across all TAISEN crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Local day**: Start-of-day computation for daily quotas via [`LocalDay`]
//!
//! # Example
//!
//! ```no_run
//! use taisen_common::{AppResult, Config, LocalDay};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let day = LocalDay::from_config(&config.limits)?;
//!     println!("Today started at {}", day.start_of_today());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod local_day;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use local_day::LocalDay;
