//! Test helpers for exercising a document-database client against an emulator.
//!
//! The helpers sit on top of the [`client::DocumentClient`] seam: they build
//! requests, route them to a partition, retry rate-limited or transient
//! failures and tear test data down again. [`emulator::Emulator`] is an
//! in-process implementation of that seam backed by SQLite.

pub mod address;
pub mod assertions;
pub mod auth;
pub mod blocking;
pub mod client;
pub mod config;
pub mod emulator;
pub mod error;
pub mod files;
pub mod headers;
pub mod logging;
pub mod request;
pub mod resource;
pub mod retry;
pub mod routing;
pub mod session;
pub mod testkit;

pub use address::ResourceAddress;
pub use error::{ClientError, Result, TestkitError};
pub use headers::Headers;
pub use testkit::Testkit;
