//! Core types and trait definitions for the LogiChronos shipment planner.
//!
//! Free of HTTP and database dependencies. The registry is derived here from
//! the flat milestone log, and every mutation rule lives here too.

// Trait methods declare their `Send` futures explicitly.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod event;
pub mod export;
pub mod mutation;
pub mod planner;
pub mod registry;
pub mod store;
pub mod suggest;

pub use error::{Error, Result};
