//! Lexi core: storage schema, the chat database, and the proxy request
//! pipeline. Platform adapters plug in through the traits in [`ports`].

pub mod ports;
pub mod event_bus;
pub mod schema;
pub mod db;
pub mod proxy;
pub mod smooth;
pub mod sse;
