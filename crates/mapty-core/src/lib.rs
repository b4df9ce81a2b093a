//! Core types and trait definitions for the Mapty workout log.
//!
//! No database or terminal code lives here. Storage backends and front-ends
//! depend on this crate, never the other way round.

pub mod codec;
pub mod error;
pub mod factory;
pub mod geo;
pub mod log;
pub mod store;
pub mod view;
pub mod workout;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
