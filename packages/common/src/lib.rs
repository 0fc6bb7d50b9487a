pub mod config;
pub mod course_user_kind;
pub mod error;
pub mod feedback;
pub mod question_status;
pub mod semester;
pub mod statistic;

pub use config::StatisticsConfig;
pub use course_user_kind::CourseUserKind;
pub use error::ParseEnumError;
pub use feedback::FeedbackQuestionKind;
pub use question_status::{QuestionStatus, RejectionReason};
pub use semester::Term;
pub use statistic::StatisticMetric;
