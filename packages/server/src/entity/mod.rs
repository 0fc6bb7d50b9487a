pub mod course;
pub mod course_user;
pub mod document;
pub mod feedback_answer;
pub mod feedback_question;
pub mod membership_invite;
pub mod question;
pub mod queue;
pub mod queue_statistic;
pub mod role;
pub mod role_permission;
pub mod semester;
pub mod user;
pub mod vector_db;
