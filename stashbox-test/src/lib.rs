#![doc = include_str!("../README.md")]

pub mod fixtures;
pub mod mock_network;
pub mod mock_storage;
pub mod tracing;

pub use mock_network::{MockNetwork, Reply};
pub use mock_storage::{MockStorage, StorageCounters};
