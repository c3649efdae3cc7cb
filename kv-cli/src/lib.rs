//! `kvcli` is an interactive client for the in-process demo cluster built
//! on top of the `kv` crate's `TransactionCoordinator`.
//!
//! ## Getting started
//!
//! ```doc
//! ❯ ./kvcli
//!
//! Welcome to kvcli.
//!
//! kvcli > BEGIN
//! OK
//! kvcli > PUT order_key xxx
//! OK
//! kvcli > GET order_key
//! xxx
//! kvcli > COMMIT
//! OK committed at ts=1
//! ```

pub mod config;
pub mod rusty;
pub mod session;
pub mod trace;
