use log::{debug, info};
use model::{errors::ConstraintError, session::Session, subscription::Subscription};
use mongodb::bson::oid::ObjectId;
use service::{courses::Courses, directory::Directory, sessions::Sessions};
use storage::{session::Db, Storage};
use tx_macro::tx;

pub mod error;
pub mod service;

pub use error::{AcademyError, Result};

#[derive(Clone)]
pub struct Academy {
    pub db: Db,
    pub courses: Courses,
    pub sessions: Sessions,
    pub directory: Directory,
}

impl Academy {
    pub fn new(storage: Storage) -> Self {
        let courses = Courses::new(storage.courses.clone(), storage.sessions.clone());
        let sessions = Sessions::new(
            storage.sessions,
            storage.courses,
            storage.partners.clone(),
        );
        let directory = Directory::new(storage.partners, storage.users);
        Academy {
            db: storage.db,
            courses,
            sessions,
            directory,
        }
    }

    pub async fn start_session(&self, actor: ObjectId) -> Result<Session> {
        Ok(self.db.start_session(actor).await?)
    }

    /// Adds every requested attendee to every selected session. All sessions
    /// are updated in one transaction: a missing session or an instructor
    /// among the new attendees leaves every session untouched.
    #[tx]
    pub async fn subscribe(&self, session: &mut Session, request: Subscription) -> Result<()> {
        if request.is_empty() {
            debug!("empty subscription request");
            return Ok(());
        }
        self.sessions
            .ensure_partners(session, &request.attendees)
            .await?;

        for id in &request.sessions {
            let mut course_session = self.sessions.load(session, *id).await?;
            let warning = request.apply(&mut course_session);
            course_session.check()?;
            service::sessions::report(&course_session, warning);
            self.sessions.update(session, &course_session).await?;
        }
        info!(
            "subscribed {} attendees to {} sessions",
            request.attendees.len(),
            request.sessions.len()
        );
        Ok(())
    }

    /// Removes an account. Courses it was responsible for keep existing
    /// with no responsible user.
    #[tx]
    pub async fn remove_user(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        if !self.directory.users.delete(session, id).await? {
            return Err(ConstraintError::UserNotFound(id).into());
        }
        let released = self.courses.clear_responsible(session, id).await?;
        info!("user removed: {} ({} courses released)", id, released);
        Ok(())
    }
}
