//! Property tests for the reservation engine's core guarantees.

mod atomicity;
mod finalization;
