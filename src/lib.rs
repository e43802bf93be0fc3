//! Revdelta: delta-compressed text version history in Rust.
//!
//! The crate provides:
//! - A self-contained character diff/patch engine (`diff`)
//! - A version store keeping a base text plus one delta per version (`store`)
//! - File-oriented save/load helpers with atomic replacement (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use revdelta::store::VersionStore;
//!
//! let mut store = VersionStore::new();
//! store.add_version("Hello World");
//! store.add_version("Hello, World!!!");
//!
//! let mut saved = Vec::new();
//! store.save(&mut saved).unwrap();
//!
//! let mut restored = VersionStore::new();
//! restored.load(saved.as_slice()).unwrap();
//! assert_eq!(restored.get_version(2).unwrap(), "Hello, World!!!");
//! ```

pub mod diff;
pub mod error;
pub mod io;
pub mod store;

pub use error::{Result, StoreError};

#[cfg(feature = "cli")]
pub mod cli;
