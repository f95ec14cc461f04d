//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the bridge against
//! in-memory native services. Everything runs on the host.

mod dispatcher_tests;
mod facade_tests;
