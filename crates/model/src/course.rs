use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::errors::ConstraintError;

pub const COPY_PREFIX: &str = "Copy of ";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub responsible: Option<ObjectId>,
    #[serde(default)]
    pub version: u64,
}

/// Fields that replace the source values when a course is duplicated.
#[derive(Debug, Clone, Default)]
pub struct CourseOverrides {
    pub description: Option<String>,
    pub responsible: Option<ObjectId>,
}

impl Course {
    pub fn new(name: String, description: Option<String>, responsible: Option<ObjectId>) -> Course {
        Course {
            id: ObjectId::new(),
            name,
            description,
            responsible,
            version: 0,
        }
    }

    /// Row level checks. Name uniqueness needs the whole collection and is
    /// left to the store.
    pub fn check(&self) -> Result<(), ConstraintError> {
        if self.name.trim().is_empty() {
            return Err(ConstraintError::EmptyName);
        }
        if self.description.as_deref() == Some(self.name.as_str()) {
            return Err(ConstraintError::NameEqualsDescription);
        }
        Ok(())
    }

    /// Builds the duplicate of this course. `copies` is the number of
    /// courses already named after a copy of this one. The generated name is
    /// not re-checked here; a stale count surfaces as a uniqueness failure
    /// on insert.
    pub fn duplicate(&self, copies: u64, overrides: CourseOverrides) -> Course {
        Course {
            id: ObjectId::new(),
            name: copy_name(&self.name, copies),
            description: overrides.description.or_else(|| self.description.clone()),
            responsible: overrides.responsible.or(self.responsible),
            version: 0,
        }
    }
}

pub fn copy_prefix(name: &str) -> String {
    format!("{}{}", COPY_PREFIX, name)
}

pub fn copy_name(name: &str, copies: u64) -> String {
    if copies == 0 {
        copy_prefix(name)
    } else {
        format!("{} ({})", copy_prefix(name), copies)
    }
}
