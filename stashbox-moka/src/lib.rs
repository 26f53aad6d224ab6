#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod backend;
mod builder;
pub mod metrics;

pub use backend::MokaStorage;
pub use builder::{ByteCapacity, EntryCapacity, MokaStorageBuilder, NoCapacity, Unbounded};
pub use moka::policy::EvictionPolicy;
