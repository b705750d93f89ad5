pub mod course;
pub mod dates;
pub mod exam;
pub mod task;
pub mod user;

pub use course::{Course, NewCourseRequest, UpdateCourseRequest, DEFAULT_COURSE_COLOR};
pub use exam::{Exam, ExamRow, NewExamRequest, RevisionSession, SessionCompletionRequest};
pub use task::{NewTaskRequest, Priority, Task, TaskView, UpdateTaskRequest};
pub use user::{NewUserRequest, Role, User};
