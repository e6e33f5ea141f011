//! Content fetching.
//!
//! [`FetchCoordinator`] is the only writer of a resource cache. It loads
//! data through a [`ContentSource`], normally the HTTP [`ContentClient`].

mod client;
mod coordinator;
mod error;
mod source;

pub use client::ContentClient;
pub use coordinator::{FetchCoordinator, FetchOutcome};
pub use error::FetchError;
pub use source::ContentSource;
