use bson::oid::ObjectId;
use thiserror::Error;

/// Blocking rule violations. Any of these aborts the write that triggered it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("Name must not be empty")]
    EmptyName,
    #[error("The title of the course should not be the description")]
    NameEqualsDescription,
    #[error("The course title must be unique: {0}")]
    CourseNameTaken(String),
    #[error("A session's instructor can't be an attendee")]
    InstructorIsAttendee {
        session_id: ObjectId,
        instructor: ObjectId,
    },
    #[error("Course not found: {0}")]
    CourseNotFound(ObjectId),
    #[error("Session not found: {0}")]
    SessionNotFound(ObjectId),
    #[error("Partner not found: {0}")]
    PartnerNotFound(ObjectId),
    #[error("User not found: {0}")]
    UserNotFound(ObjectId),
}
