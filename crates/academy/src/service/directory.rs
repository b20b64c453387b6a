use log::info;
use model::{partner::Partner, session::Session, user::User};
use storage::{partner::PartnerStore, user::UserStore};
use tx_macro::tx;

use crate::error::Result;

/// People and accounts. The course module only reads them, apart from
/// seeding and removal.
#[derive(Clone)]
pub struct Directory {
    pub partners: PartnerStore,
    pub users: UserStore,
}

impl Directory {
    pub(crate) fn new(partners: PartnerStore, users: UserStore) -> Self {
        Directory { partners, users }
    }

    #[tx]
    pub async fn add_partner(&self, session: &mut Session, partner: Partner) -> Result<Partner> {
        self.partners.insert(session, &partner).await?;
        info!("partner added: {} {}", partner.id, partner.name);
        Ok(partner)
    }

    #[tx]
    pub async fn add_user(&self, session: &mut Session, user: User) -> Result<User> {
        self.users.insert(session, &user).await?;
        info!("user added: {} {}", user.id, user.login);
        Ok(user)
    }

    /// Candidates for the instructor of a session.
    pub async fn instructors(&self, session: &mut Session) -> Result<Vec<Partner>> {
        let partners = self.partners.instructors(session).await?;
        Ok(partners.into_iter().filter(Partner::can_teach).collect())
    }
}
