use model::errors::ConstraintError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcademyError {
    #[error("Constraint violated: {0}")]
    Constraint(#[from] ConstraintError),
    #[error("Mongo error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
}

impl AcademyError {
    pub fn constraint(&self) -> Option<&ConstraintError> {
        match self {
            AcademyError::Constraint(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = AcademyError> = std::result::Result<T, E>;
