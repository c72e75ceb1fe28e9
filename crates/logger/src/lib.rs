//! Shared tracing setup for the UpKeep binaries.

mod subscriber;

pub use subscriber::{LogFormat, init};
