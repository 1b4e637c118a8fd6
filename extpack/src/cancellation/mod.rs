//! Cooperative cancellation for a running build.

mod token;

pub use token::CancellationToken;
