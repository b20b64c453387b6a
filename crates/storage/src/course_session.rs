use bson::to_document;
use eyre::{eyre, Result};
use futures_util::TryStreamExt as _;
use model::{course_session::CourseSession, session::Session};
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "sessions";

#[derive(Clone)]
pub struct SessionStore {
    pub(crate) store: Collection<CourseSession>,
}

impl SessionStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let store = db.collection(COLLECTION);
        store
            .create_index(IndexModel::builder().keys(doc! { "course_id": 1 }).build())
            .await?;
        store
            .create_index(IndexModel::builder().keys(doc! { "attendees": 1 }).build())
            .await?;
        store
            .create_index(IndexModel::builder().keys(doc! { "instructor": 1 }).build())
            .await?;
        Ok(SessionStore { store })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<CourseSession>> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    /// Sessions of a course. Archived ones (`active == false`) only on request.
    pub async fn find_by_course(
        &self,
        session: &mut Session,
        course_id: ObjectId,
        with_archived: bool,
    ) -> Result<Vec<CourseSession>> {
        let filter = if with_archived {
            doc! { "course_id": course_id }
        } else {
            doc! { "course_id": course_id, "active": true }
        };
        let mut cursor = self
            .store
            .find(filter)
            .sort(doc! { "start_date": 1, "_id": 1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn count(&self, session: &mut Session) -> Result<u64> {
        Ok(self
            .store
            .count_documents(doc! {})
            .session(&mut *session)
            .await?)
    }

    pub async fn insert(&self, session: &mut Session, course_session: &CourseSession) -> Result<()> {
        self.store
            .insert_one(course_session)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    /// Writes back every field together with the derived views.
    pub async fn update(&self, session: &mut Session, course_session: &CourseSession) -> Result<()> {
        let mut update = to_document(course_session)?;
        update.remove("_id");
        update.remove("version");
        let result = self
            .store
            .update_one(
                doc! { "_id": course_session.id },
                doc! { "$set": update, "$inc": { "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        if result.matched_count == 0 {
            return Err(eyre!("Session not found: {}", course_session.id));
        }
        Ok(())
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        self.store
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        Ok(())
    }

    /// Cascade for a removed course. Returns the number of deleted sessions.
    pub async fn delete_by_course(&self, session: &mut Session, course_id: ObjectId) -> Result<u64> {
        let result = self
            .store
            .delete_many(doc! { "course_id": course_id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count)
    }
}
