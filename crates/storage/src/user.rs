use eyre::Result;
use model::{session::Session, user::User};
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::IndexOptions,
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "users";

#[derive(Clone)]
pub struct UserStore {
    pub(crate) users: Collection<User>,
}

impl UserStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let users = db.collection(COLLECTION);
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "login": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        Ok(UserStore { users })
    }

    pub async fn insert(&self, session: &mut Session, user: &User) -> Result<()> {
        self.users.insert_one(user).session(&mut *session).await?;
        Ok(())
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<bool> {
        let result = self
            .users
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
