pub mod course;
pub mod course_session;
pub mod decimal;
pub mod errors;
pub mod partner;
pub mod session;
pub mod subscription;
pub mod user;
