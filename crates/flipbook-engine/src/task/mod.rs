pub mod queue;
pub mod task;

pub use queue::{QueueStatus, TaskQueue};
pub use task::{Task, TaskCtl, TaskKind};
