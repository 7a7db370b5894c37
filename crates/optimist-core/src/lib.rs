//! # optimist-core — Foundational Types for the Optimistic Oracle
//!
//! Leaf crate of the workspace. Defines the value-level primitives every
//! other crate builds on: time, accounts, money, topics and the request key
//! that names a request everywhere in the protocol.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for domain primitives.** `Address`, `Currency`, `Identifier`,
//!    `Amount`, `FixedPoint`: validated constructors, no bare strings or
//!    integers crossing crate boundaries.
//!
//! 2. **Injected time.** Nothing reads the wall clock directly. Callers pass a
//!    [`Clock`]; tests drive a [`ManualClock`].
//!
//! 3. **Content-addressed request identity.** A [`RequestId`] is the SHA-256
//!    of the JCS-canonical [`RequestKey`]. Identical keys always produce the
//!    same id, across processes.
//!
//! 4. **Checked arithmetic.** Every operation on [`Amount`] that can overflow
//!    returns a `Result`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `optimist-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod ancillary;
pub mod canonical;
pub mod clock;
pub mod digest;
pub mod error;
pub mod identity;
pub mod key;
pub mod temporal;

pub use amount::{Amount, FixedPoint};
pub use ancillary::{AncillaryData, MAX_STAMPED_ANCILLARY_LEN};
pub use canonical::CanonicalBytes;
pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{Address, Currency, Identifier};
pub use key::{RequestId, RequestKey};
pub use temporal::Timestamp;
