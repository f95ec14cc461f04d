//! Application core: pure bridge logic, no host or platform I/O.
//!
//! The native delivery service and the host's signal mechanism are both
//! reached through **port traits** defined in [`ports`], so this layer is
//! fully testable with in-memory adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
