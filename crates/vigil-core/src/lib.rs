//! Vigil Core - shared types for the scenario execution engine
//!
//! This crate holds everything the other Vigil crates agree on and nothing
//! that performs I/O itself:
//!
//! - [`DynamicValue`]: the explicit value model scenarios use for fixtures
//! - [`codec`]: the structured value codec between [`DynamicValue`] and the
//!   typed attribute wire format of key-value tables
//! - [`effects`]: narrow collaborator capabilities (object store, key-value
//!   table, function, queue, pub-sub, relational, time)
//! - [`config`]: the service configuration record, loader and validator
//! - [`VigilError`]: the crate-spanning error type

#![forbid(unsafe_code)]

/// Structured value codec
pub mod codec;

/// Service configuration
pub mod config;

/// Collaborator effect traits
pub mod effects;

/// Unified error handling
pub mod errors;

/// Dynamic value trees
pub mod value;

pub use codec::{decode, decode_item, encode, encode_item, AttributeWire, CodecError, WireItem};
pub use config::{ServiceConfig, VigilConfig};
pub use errors::{Result, VigilError};
pub use value::{DynamicMap, DynamicValue};
