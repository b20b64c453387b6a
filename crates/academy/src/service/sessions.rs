use std::ops::Deref;

use chrono::{Local, NaiveDate};
use log::{info, warn};
use model::{
    course_session::{CourseSession, SeatWarning, SessionEdit},
    decimal::Decimal,
    errors::ConstraintError,
    session::Session,
};
use mongodb::bson::oid::ObjectId;
use storage::{course::CourseStore, course_session::SessionStore, partner::PartnerStore};
use tx_macro::tx;

use crate::error::Result;

/// Input of [`Sessions::create`]. Unset fields take the record defaults.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub course_id: ObjectId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub duration: Decimal,
    pub seats: i32,
    pub instructor: Option<ObjectId>,
    pub attendees: Vec<ObjectId>,
}

impl NewSession {
    pub fn new(course_id: ObjectId, name: String) -> NewSession {
        NewSession {
            course_id,
            name,
            start_date: None,
            duration: Decimal::zero(),
            seats: 0,
            instructor: None,
            attendees: Vec::new(),
        }
    }

    /// Partners referenced by the new record: the instructor, then the
    /// attendees.
    pub fn partners(&self) -> Vec<ObjectId> {
        self.instructor
            .iter()
            .chain(self.attendees.iter())
            .copied()
            .collect()
    }

    fn build(self, today: NaiveDate) -> (CourseSession, Option<SeatWarning>) {
        let mut session = CourseSession::new(
            self.course_id,
            self.name,
            self.start_date.unwrap_or(today),
        );
        session.set_duration(self.duration);
        session.set_instructor(self.instructor);
        session.set_seats(self.seats);
        let warning = session.add_attendees(&self.attendees);
        (session, warning)
    }
}

#[derive(Clone)]
pub struct Sessions {
    store: SessionStore,
    courses: CourseStore,
    partners: PartnerStore,
}

impl Sessions {
    pub(crate) fn new(store: SessionStore, courses: CourseStore, partners: PartnerStore) -> Self {
        Sessions {
            store,
            courses,
            partners,
        }
    }

    #[tx]
    pub async fn create(
        &self,
        session: &mut Session,
        new: NewSession,
    ) -> Result<(CourseSession, Option<SeatWarning>)> {
        if self.courses.get(session, new.course_id).await?.is_none() {
            return Err(ConstraintError::CourseNotFound(new.course_id).into());
        }
        self.ensure_partners(session, &new.partners()).await?;
        let (course_session, warning) = new.build(Local::now().date_naive());
        course_session.check()?;
        report(&course_session, warning);
        self.store.insert(session, &course_session).await?;
        info!(
            "session created: {} {} for course {}",
            course_session.id, course_session.name, course_session.course_id
        );
        Ok((course_session, warning))
    }

    /// Applies one write and persists the record with its derived views.
    /// The instructor check runs on every write; the seat check only warns.
    #[tx]
    pub async fn edit(
        &self,
        session: &mut Session,
        id: ObjectId,
        edit: SessionEdit,
    ) -> Result<(CourseSession, Option<SeatWarning>)> {
        let mut course_session = self.load(session, id).await?;
        self.ensure_partners(session, &edit.partners()).await?;
        let warning = edit.apply(&mut course_session);
        course_session.check()?;
        report(&course_session, warning);
        self.store.update(session, &course_session).await?;
        Ok((course_session, warning))
    }

    /// Same as [`Sessions::edit`] without writing anything. Lets an editor
    /// show derived values and warnings before the user commits.
    pub async fn preview(
        &self,
        session: &mut Session,
        id: ObjectId,
        edit: SessionEdit,
    ) -> Result<(CourseSession, Option<SeatWarning>)> {
        let mut course_session = self.load(session, id).await?;
        let warning = edit.apply(&mut course_session);
        Ok((course_session, warning))
    }

    #[tx]
    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        self.load(session, id).await?;
        self.store.delete(session, id).await?;
        info!("session deleted: {}", id);
        Ok(())
    }

    pub(crate) async fn load(&self, session: &mut Session, id: ObjectId) -> Result<CourseSession> {
        self.store
            .get(session, id)
            .await?
            .ok_or_else(|| ConstraintError::SessionNotFound(id).into())
    }

    /// Fails with `PartnerNotFound` on the first id missing from the directory.
    pub(crate) async fn ensure_partners(&self, session: &mut Session, ids: &[ObjectId]) -> Result<()> {
        for id in ids {
            if self.partners.get(session, *id).await?.is_none() {
                return Err(ConstraintError::PartnerNotFound(*id).into());
            }
        }
        Ok(())
    }
}

pub(crate) fn report(course_session: &CourseSession, warning: Option<SeatWarning>) {
    if let Some(warning) = warning {
        warn!(
            "session {}: {}. {}",
            course_session.id, warning.title, warning.message
        );
    }
}

impl Deref for Sessions {
    type Target = SessionStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    #[test]
    fn test_build_defaults() {
        let course = ObjectId::new();
        let (session, warning) = NewSession::new(course, "Intro".to_string()).build(today());
        assert_eq!(warning, None);
        assert_eq!(session.course_id, course);
        assert_eq!(session.start_date(), Some(today()));
        assert_eq!(session.end_date(), Some(today()));
        assert!(session.is_active());
        assert_eq!(session.check(), Ok(()));
    }

    #[test]
    fn test_build_runs_seat_check() {
        let new = NewSession {
            seats: 1,
            attendees: vec![ObjectId::new(), ObjectId::new()],
            duration: Decimal::int(3),
            ..NewSession::new(ObjectId::new(), "Crowded".to_string())
        };
        let (session, warning) = new.build(today());
        assert!(warning.is_some());
        assert!(!session.is_active());
        assert_eq!(session.taken_seats(), 200.0);
        assert_eq!(session.end_date(), NaiveDate::from_ymd_opt(2024, 9, 4));
    }

    #[test]
    fn test_build_rejects_instructor_among_attendees() {
        let instructor = ObjectId::new();
        let new = NewSession {
            instructor: Some(instructor),
            seats: 10,
            attendees: vec![instructor],
            ..NewSession::new(ObjectId::new(), "Self taught".to_string())
        };
        let (session, _) = new.build(today());
        assert!(session.check().is_err());
    }

    #[test]
    fn test_new_session_partners() {
        let instructor = ObjectId::new();
        let attendee = ObjectId::new();
        let mut new = NewSession::new(ObjectId::new(), "Lab".to_string());
        assert!(new.partners().is_empty());

        new.attendees = vec![attendee];
        assert_eq!(new.partners(), vec![attendee]);

        new.instructor = Some(instructor);
        assert_eq!(new.partners(), vec![instructor, attendee]);
    }

    #[test]
    fn test_build_rejects_unnamed_session() {
        let (session, _) = NewSession::new(ObjectId::new(), String::new()).build(today());
        assert_eq!(session.check(), Err(ConstraintError::EmptyName));
    }
}
