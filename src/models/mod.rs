pub mod task;

pub use task::{
    CreateTask, NewTask, ReplaceTask, Task, TaskChanges, TaskReplacement, UpdateTask,
    ValidationError,
};
