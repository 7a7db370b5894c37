//! # optimist-cli — Command-Line Tooling for the Optimistic Oracle
//!
//! Provides the `optimist` binary.
//!
//! ## Subcommands
//!
//! - `optimist validate` — Parse and validate an oracle configuration file.
//! - `optimist simulate` — Replay a YAML scenario against in-memory escrow
//!   and arbitrator backends and print a JSON report.
//!
//! ```bash
//! optimist validate oracle.yaml
//! optimist simulate crates/optimist-cli/scenarios/disputed-price.yaml
//! optimist --config oracle.yaml simulate scenario.yaml --out report.json
//! ```

pub mod scenario;
pub mod simulate;
pub mod validate;
