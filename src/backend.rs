use crate::error::Result;
use crate::types::{Contact, ContactPatch, Engagement, User};
use chrono::{DateTime, Utc};

/// Persistence collaborator holding the `contacts` and `engagements`
/// collections.
///
/// Each method is an independent write; implementations are not required to
/// offer multi-row transactions.
pub trait Persistence {
    /// All contacts owned by `owner`, ordered by name, each carrying its
    /// engagements most recent first
    fn select_contacts(&self, owner: &str) -> Result<Vec<Contact>>;

    fn insert_contact(&self, owner: &str, contact: &Contact) -> Result<()>;

    /// Apply a partial update. Fails with `NotFound` if no row matched.
    fn update_contact(&self, id: &str, patch: &ContactPatch, updated_at: DateTime<Utc>) -> Result<()>;

    fn insert_engagement(&self, engagement: &Engagement) -> Result<()>;
}

/// Authentication collaborator. Only a stable user id is needed to scope
/// contact ownership.
pub trait AuthProvider {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<User>;
    fn sign_out(&mut self) -> Result<()>;
    fn current_user(&self) -> Option<&User>;
}
