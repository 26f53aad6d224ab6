#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod network;

pub use network::{ReqwestNetwork, ReqwestNetworkBuilder};

/// Re-export of the reqwest client for custom configuration.
pub use reqwest::Client;
