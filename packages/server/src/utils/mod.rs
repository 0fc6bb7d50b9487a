pub mod course;
pub mod hash;
pub mod jwt;
