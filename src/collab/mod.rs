//! Collaborators the core calls out to: the content store records come from, and the
//! alerting sink for operational failures.

pub mod content_store;
pub mod notify;
