//! Execution services.

mod pipeline;
mod watchdog;

pub use pipeline::TaskExecutionService;
pub use watchdog::TaskWatchdog;
