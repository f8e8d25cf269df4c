//! The adaptive poll loop.
//!
//! [`Poller::poll`] runs one request/apply cycle against the backend;
//! [`run_polling`] repeats it forever (until cancelled), bursting to the fast
//! interval after every update and decaying to the slow one when idle.

pub mod backoff;
pub mod errors;
pub mod poller;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use backoff::Backoff;
pub use errors::PollError;
pub use poller::Poller;
pub use scheduler::{PollingSummary, SharedPoller, run_polling};
