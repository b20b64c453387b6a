use std::ops::Deref;

use log::info;
use model::{
    course::{Course, CourseOverrides},
    errors::ConstraintError,
    session::Session,
};
use mongodb::bson::oid::ObjectId;
use storage::{course::CourseStore, course_session::SessionStore};
use tx_macro::tx;

use crate::error::Result;

#[derive(Clone)]
pub struct Courses {
    store: CourseStore,
    sessions: SessionStore,
}

impl Courses {
    pub(crate) fn new(store: CourseStore, sessions: SessionStore) -> Self {
        Courses { store, sessions }
    }

    /// Creates a course. Without an explicit owner the acting user becomes
    /// responsible for it.
    #[tx]
    pub async fn create(
        &self,
        session: &mut Session,
        name: String,
        description: Option<String>,
        responsible: Option<ObjectId>,
    ) -> Result<Course> {
        let responsible = responsible.or_else(|| Some(session.actor()));
        let course = Course::new(name, description, responsible);
        course.check()?;
        if self.store.get_by_name(session, &course.name).await?.is_some() {
            return Err(ConstraintError::CourseNameTaken(course.name).into());
        }
        self.store.insert(session, &course).await?;
        info!("course created: {} {}", course.id, course.name);
        Ok(course)
    }

    #[tx]
    pub async fn rename(&self, session: &mut Session, id: ObjectId, name: String) -> Result<Course> {
        let mut course = self.load(session, id).await?;
        if let Some(other) = self.store.get_by_name(session, &name).await? {
            if other.id != id {
                return Err(ConstraintError::CourseNameTaken(name).into());
            }
        }
        course.name = name;
        course.check()?;
        self.store.update(session, &course).await?;
        Ok(course)
    }

    #[tx]
    pub async fn set_description(
        &self,
        session: &mut Session,
        id: ObjectId,
        description: Option<String>,
    ) -> Result<Course> {
        let mut course = self.load(session, id).await?;
        course.description = description;
        course.check()?;
        self.store.update(session, &course).await?;
        Ok(course)
    }

    #[tx]
    pub async fn set_responsible(
        &self,
        session: &mut Session,
        id: ObjectId,
        responsible: Option<ObjectId>,
    ) -> Result<Course> {
        let mut course = self.load(session, id).await?;
        course.responsible = responsible;
        self.store.update(session, &course).await?;
        Ok(course)
    }

    /// Copies a course under a fresh `Copy of ...` name. Sessions stay with
    /// the source. A name collision from a concurrent copy is not retried
    /// and comes back as a storage error from the unique index.
    #[tx]
    pub async fn duplicate(
        &self,
        session: &mut Session,
        id: ObjectId,
        overrides: CourseOverrides,
    ) -> Result<Course> {
        let source = self.load(session, id).await?;
        let copies = self.store.count_copies(session, &source.name).await?;
        let copy = source.duplicate(copies, overrides);
        copy.check()?;
        self.store.insert(session, &copy).await?;
        info!("course duplicated: {} -> {}", source.name, copy.name);
        Ok(copy)
    }

    /// Deletes the course together with all of its sessions.
    #[tx]
    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        let course = self.load(session, id).await?;
        let removed = self.sessions.delete_by_course(session, id).await?;
        self.store.delete(session, id).await?;
        info!(
            "course deleted: {} {} ({} sessions)",
            course.id, course.name, removed
        );
        Ok(())
    }

    pub(crate) async fn load(&self, session: &mut Session, id: ObjectId) -> Result<Course> {
        self.store
            .get(session, id)
            .await?
            .ok_or_else(|| ConstraintError::CourseNotFound(id).into())
    }
}

impl Deref for Courses {
    type Target = CourseStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
