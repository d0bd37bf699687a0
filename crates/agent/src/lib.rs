//! The agent loop for shellsmith.
//!
//! One operator request runs a **request → act → observe** cycle:
//!
//! 1. **Wait** for the rate limiter to admit a request
//! 2. **Send** the full history, the system directive and the tool schema
//! 3. **If a tool call** comes back: run the first one, append its output,
//!    and go back to step 1
//! 4. **If text** comes back: append it and return it to the operator
//!
//! The cycle ends on a text answer, a provider error, or the optional
//! iteration cap.

pub mod directive;
pub mod loop_runner;
pub mod rate_limiter;

#[cfg(test)]
mod test_helpers;

pub use directive::SystemDirective;
pub use loop_runner::{AgentLoop, ITERATION_LIMIT_NOTICE};
pub use rate_limiter::RateLimiter;
