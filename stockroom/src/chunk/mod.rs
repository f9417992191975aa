//! Upload fragment reassembly.
//!
//! Patch archives arrive in fragments small enough to survive flaky
//! uploads; each fragment lands in a scratch directory with its ordering
//! index embedded in the filename. [`ChunkStore`] owns that directory and
//! rebuilds the original file from the fragments, verifying the result
//! against a caller-supplied checksum.

mod reassembler;

pub use reassembler::{file_checksum, ChunkError, ChunkStore};
