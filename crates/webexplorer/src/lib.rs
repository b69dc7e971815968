//! Public facade crate for `webexplorer`.
//!
//! This crate intentionally contains no IO or backend-specific logic.
//! It re-exports the backend-agnostic types/traits from `webexplorer-core`.

pub use webexplorer_core::*;
