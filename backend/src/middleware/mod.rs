//! Request middleware.
//!
//! Request lifecycle concerns that wrap every route: currently trace
//! identifier scoping and request logging.

pub mod trace;

pub use trace::Trace;
