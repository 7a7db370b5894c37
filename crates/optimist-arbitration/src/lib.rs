//! # optimist-arbitration — Arbitrator Bridge
//!
//! A dispute escalates a [`Question`] to an external arbitrator whose answer
//! may arrive much later or never. The oracle only ever polls:
//! [`ArbitratorBridge::has_answer`] and [`ArbitratorBridge::get_answer`].
//! "No answer yet" is a normal, indefinitely persisting condition, never an
//! error.
//!
//! [`InMemoryArbitrator`] stands in for the real service in simulations and
//! tests. It additionally offers a `tokio::sync::broadcast` subscription so
//! async callers can wait for answers instead of polling; the oracle itself
//! does not use it.
//!
//! ## Crate Policy
//!
//! - Depends only on `optimist-core` internally.
//! - No `.unwrap()` outside tests.

pub mod bridge;
pub mod error;
pub mod memory;
pub mod question;

pub use bridge::ArbitratorBridge;
pub use error::ArbitrationError;
pub use memory::{AnsweredQuestion, InMemoryArbitrator};
pub use question::Question;
