use eyre::Result;
use futures_util::TryStreamExt as _;
use model::{
    partner::{Partner, TEACHER_CATEGORY},
    session::Session,
};
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "partners";

#[derive(Clone)]
pub struct PartnerStore {
    pub(crate) store: Collection<Partner>,
}

impl PartnerStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let store = db.collection(COLLECTION);
        store
            .create_index(IndexModel::builder().keys(doc! { "instructor": 1 }).build())
            .await?;
        store
            .create_index(IndexModel::builder().keys(doc! { "categories": 1 }).build())
            .await?;
        Ok(PartnerStore { store })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Partner>> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn instructors(&self, session: &mut Session) -> Result<Vec<Partner>> {
        let mut cursor = self
            .store
            .find(instructor_filter())
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn insert(&self, session: &mut Session, partner: &Partner) -> Result<()> {
        self.store
            .insert_one(partner)
            .session(&mut *session)
            .await?;
        Ok(())
    }
}

/// Selection of people allowed as session instructors.
/// Mirrors `Partner::can_teach`.
pub fn instructor_filter() -> Document {
    doc! {
        "$or": [
            { "instructor": true },
            { "categories": { "$regex": regex::escape(TEACHER_CATEGORY), "$options": "i" } },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructor_filter_shape() {
        let filter = instructor_filter();
        let branches = filter.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);
        let by_category = branches[1].as_document().unwrap();
        assert_eq!(
            by_category
                .get_document("categories")
                .unwrap()
                .get_str("$regex")
                .unwrap(),
            "Teacher"
        );
    }
}
