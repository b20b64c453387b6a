use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// An account able to act on the system and to be responsible for courses.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub login: String,
    pub name: String,
    #[serde(default)]
    pub version: u64,
}

impl User {
    pub fn new(login: String, name: String) -> User {
        User {
            id: ObjectId::new(),
            login,
            name,
            version: 0,
        }
    }
}
