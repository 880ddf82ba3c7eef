//! Shared foundational types used across the Mica build toolchain.
//!
//! This crate provides the module identifier type and the function dispatch
//! record shared by the manifest, the staleness solver, and the compiler
//! interface.

#![warn(missing_docs)]

pub mod module;

pub use module::{Dispatch, ModuleId};
