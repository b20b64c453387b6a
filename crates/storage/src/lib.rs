pub mod course;
pub mod course_session;
pub mod partner;
pub mod session;
pub mod user;

use course::CourseStore;
use course_session::SessionStore;
use eyre::Result;
use log::info;
use partner::PartnerStore;
use session::Db;
use user::UserStore;

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub courses: CourseStore,
    pub sessions: SessionStore,
    pub partners: PartnerStore,
    pub users: UserStore,
}

impl Storage {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let db = Db::new(uri, db_name).await?;
        info!("preparing collections in {}", db_name);
        let courses = CourseStore::new(&db).await?;
        let sessions = SessionStore::new(&db).await?;
        let partners = PartnerStore::new(&db).await?;
        let users = UserStore::new(&db).await?;

        Ok(Storage {
            db,
            courses,
            sessions,
            partners,
            users,
        })
    }
}
