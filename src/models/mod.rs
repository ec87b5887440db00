pub mod task;
pub mod user;
pub mod verification;

pub use task::{Recurrence, Task, TaskInput, TaskQuery, TaskUpdate};
pub use user::{User, UserCredentials};
pub use verification::VerificationCode;
