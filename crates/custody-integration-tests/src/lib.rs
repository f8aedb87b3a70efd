//! Integration test crate for the custody engine.
//!
//! This crate exists solely to run integration tests that drive the engine
//! through its public API. It has no public API - all functionality is in
//! the test modules.

#![forbid(unsafe_code)]
