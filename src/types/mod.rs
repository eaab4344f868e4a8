//! Wire types: request payloads, resource representations, summary output.

pub mod entities;
pub mod payload;
pub mod summary;
