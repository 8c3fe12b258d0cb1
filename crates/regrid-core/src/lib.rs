//! Core types for the regrid workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifiers shared by the storage and topology layers, the boundary
//! limits every layer enforces, and the diagnostic [`ErrorLog`] that
//! collects rejected requests for the caller to drain.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod diag;
pub mod id;
pub mod limits;

pub use diag::ErrorLog;
pub use id::{Dimension, Node};
