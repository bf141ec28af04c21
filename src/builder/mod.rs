//! Builder API for assembling sessions.
//!
//! A session needs a rules engine and its two remote collaborators; the
//! builder checks that all of them are present and optionally resumes a
//! saved game before starting.

pub mod error;
pub mod session;

pub use error::BuildError;
pub use session::SessionBuilder;
