//! Time subsystem.
//!
//! Provides the fixed-interval [`Ticker`] the runtime uses to wake the event
//! loop. It is driven by explicit `Instant`s so it can be tested without
//! sleeping.

mod ticker;

pub use ticker::Ticker;
