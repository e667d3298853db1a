//! Wire protocol for the scree PCA cluster.
//!
//! The canonical service definition lives in `proto/scree.proto`; message
//! types and the tonic client/server are generated at build time.
//! Uses protoc-bin-vendored to avoid requiring a protoc installation.

// Include generated proto code from build.rs output
pub mod scree {
    include!(concat!(env!("OUT_DIR"), "/scree.rs"));
}

// Re-export generated types at crate root for convenience
pub use scree::*;

// Conversions between wire messages and ndarray types
pub mod convert;
