//! Timesheet submission stage: batched delivery of resolved time
//! entries to the Deel API.

pub mod service;

pub use service::{SubmitOptions, TimesheetSubmitService};
