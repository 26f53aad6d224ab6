//! Offload manager for background task execution.
//!
//! The stale-while-revalidate strategy hands the cached asset back to the
//! page right away and refreshes the stored copy here, detached from the
//! request that triggered it.
//!
//! # Example
//!
//! ```
//! use stashbox::offload::{OffloadConfig, OffloadManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = OffloadManager::new(OffloadConfig::default());
//!
//! manager.spawn("warmup", async {
//!     // refresh something
//! });
//! manager.wait_all().await;
//! # }
//! ```

mod manager;
mod policy;

pub use manager::{OffloadManager, TaskKey};
pub use policy::{OffloadConfig, TimeoutPolicy};
