use bson::to_document;
use eyre::{eyre, Result};
use futures_util::TryStreamExt as _;
use model::{
    course::{copy_prefix, Course},
    session::Session,
};
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "courses";

#[derive(Clone)]
pub struct CourseStore {
    pub(crate) store: Collection<Course>,
}

impl CourseStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let store = db.collection(COLLECTION);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        store
            .create_index(IndexModel::builder().keys(doc! { "responsible": 1 }).build())
            .await?;
        Ok(CourseStore { store })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Course>> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    /// Exact name lookup.
    pub async fn get_by_name(&self, session: &mut Session, name: &str) -> Result<Option<Course>> {
        Ok(self
            .store
            .find_one(doc! { "name": name })
            .session(&mut *session)
            .await?)
    }

    pub async fn find(&self, session: &mut Session, query: Option<&str>) -> Result<Vec<Course>> {
        let filter = if let Some(query) = query {
            doc! {
                "name": { "$regex": regex::escape(query), "$options": "i" }
            }
        } else {
            doc! {}
        };

        let mut cursor = self.store.find(filter).session(&mut *session).await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// Counts courses named `Copy of <name>*`, ignoring case.
    pub async fn count_copies(&self, session: &mut Session, name: &str) -> Result<u64> {
        Ok(self
            .store
            .count_documents(copies_filter(name))
            .session(&mut *session)
            .await?)
    }

    pub async fn count(&self, session: &mut Session) -> Result<u64> {
        Ok(self
            .store
            .count_documents(doc! {})
            .session(&mut *session)
            .await?)
    }

    /// Plain insert. A name clash fails on the unique index.
    pub async fn insert(&self, session: &mut Session, course: &Course) -> Result<()> {
        self.store
            .insert_one(course)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn update(&self, session: &mut Session, course: &Course) -> Result<()> {
        let mut update = to_document(course)?;
        update.remove("_id");
        update.remove("version");
        let result = self
            .store
            .update_one(
                doc! { "_id": course.id },
                doc! { "$set": update, "$inc": { "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        if result.matched_count == 0 {
            return Err(eyre!("Course not found: {}", course.id));
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

    /// Drops the reference to a removed user. Returns the number of courses touched.
    pub async fn clear_responsible(&self, session: &mut Session, user: ObjectId) -> Result<u64> {
        let result = self
            .store
            .update_many(
                doc! { "responsible": user },
                doc! { "$set": { "responsible": null }, "$inc": { "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        Ok(result.modified_count)
    }
}

fn copies_filter(name: &str) -> Document {
    doc! {
        "name": {
            "$regex": format!("^{}", regex::escape(&copy_prefix(name))),
            "$options": "i",
        }
    }
}
