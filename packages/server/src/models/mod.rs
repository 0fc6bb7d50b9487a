pub mod auth;
pub mod course;
pub mod feedback;
pub mod member;
pub mod question;
pub mod queue;
pub mod semester;
pub mod shared;
pub mod statistics;
pub mod vector_db;
