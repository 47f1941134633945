//! Price-time priority matching.

pub mod matcher;

pub use matcher::{BookSnapshot, Matcher, SubmitStatus};
