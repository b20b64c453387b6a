use bson::oid::ObjectId;

use crate::course_session::{CourseSession, SeatWarning};

/// Bulk request adding attendees to the selected sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subscription {
    pub sessions: Vec<ObjectId>,
    pub attendees: Vec<ObjectId>,
}

impl Subscription {
    /// Takes every selected session id, not only the first one.
    pub fn from_context(active_ids: &[ObjectId], attendees: Vec<ObjectId>) -> Subscription {
        let mut sessions = Vec::with_capacity(active_ids.len());
        for id in active_ids {
            if !sessions.contains(id) {
                sessions.push(*id);
            }
        }
        Subscription {
            sessions,
            attendees,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() || self.attendees.is_empty()
    }

    pub fn apply(&self, session: &mut CourseSession) -> Option<SeatWarning> {
        session.add_attendees(&self.attendees)
    }
}
