mod task;

pub use task::{Task, TaskState, next_task_id, parse_deadline};
