pub mod dashboard;
pub mod exams;

pub use dashboard::{Dashboard, DashboardService, DashboardStats};
pub use exams::ExamService;
