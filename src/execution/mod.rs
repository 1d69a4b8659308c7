//! Process execution.
//!
//! This module provides the concurrent [`TaskManager`], the commands it
//! launches, and the mapping from plugin records to fetch commands.

mod command;
mod fetch;
mod manager;

pub use command::{CommandLine, TaskCommand};
pub use fetch::{FetchAction, FetchPlan};
pub use manager::{Completion, Outcome, ProcessRecord, ProcessState, TaskManager, WaitSummary};
