//! Browser adapters for Lexi: key-value storage backends implementing
//! [`lexi_core::ports::StoragePort`] and the fetch-based client of the
//! streaming proxy.

pub mod storage;
pub mod client;
