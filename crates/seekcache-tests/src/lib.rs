//! Integration test crate for seekcache.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It drives the reader over a synthetic decoder to verify the cache,
//! seek policy and stream synchronization work together.


#[cfg(test)]
mod reader;
