pub mod auth;
pub mod course;
pub mod feedback;
pub mod member;
pub mod queue;
pub mod question;
pub mod semester;
pub mod statistics;
pub mod vector_db;
