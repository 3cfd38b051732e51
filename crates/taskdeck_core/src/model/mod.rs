mod task;

pub use task::{
    Deadline, NEAR_DEADLINE_DAYS, Task, TaskPayload, classify_deadline, parse_due_date,
};
