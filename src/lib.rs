//! Rateguard — typed chat-completion API errors and rate-limit aware retry.
//!
//! The upstream HTTP client reports failures as opaque strings. The
//! [`interpreter`] turns them into [`ApiError`](interpreter::ApiError) values
//! that can be classified, and [`RetryPolicy`](util::retry::RetryPolicy)
//! uses that to sleep out advised rate limits.
//!
//! # Quick Start
//!
//! ```no_run
//! use rateguard::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RateguardConfig::load()?.retry_policy();
//! let reply = policy
//!     .execute(|| async {
//!         // Call the chat-completion API here.
//!         Ok::<_, String>("done")
//!     })
//!     .await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod interpreter;
pub mod prelude;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
