use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Category granting the teaching capability, matched ignoring case.
pub const TEACHER_CATEGORY: &str = "Teacher";

/// A person from the directory: attendee or instructor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Partner {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub instructor: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub version: u64,
}

impl Partner {
    pub fn new(name: String) -> Partner {
        Partner {
            id: ObjectId::new(),
            name,
            instructor: false,
            categories: Vec::new(),
            version: 0,
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Partner {
        self.categories = categories;
        self
    }

    pub fn as_instructor(mut self) -> Partner {
        self.instructor = true;
        self
    }

    /// Instructor candidates are flagged or belong to a teacher category.
    pub fn can_teach(&self) -> bool {
        let teacher = TEACHER_CATEGORY.to_lowercase();
        self.instructor
            || self
                .categories
                .iter()
                .any(|category| category.to_lowercase().contains(&teacher))
    }
}
