//! Error reporting for the gox front end.
//!
//! Scanning and parsing are tolerant: they report every problem they can
//! describe and keep going. [`ErrorList`] is the accumulator both phases
//! share; callers inspect it (or its [`ErrorList::err`] summary) after
//! the phase completes.

mod error;

pub use error::{Error, ErrorList};
