//! Workflow and history services

pub mod history;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use history::HistoryStore;
pub use orchestrator::{Collaborators, Orchestrator, WorkflowSnapshot};
