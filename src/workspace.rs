use crate::auth::LocalAuth;
use crate::config::{find_circle_path, CircleConfig};
use crate::db::{SqliteBackend, DB_FILE};
use crate::error::{Error, Result};
use crate::store::ContactStore;
use std::fs;
use std::path::{Path, PathBuf};

/// A .circle directory: database, config and session
pub struct Workspace {
    circle_path: PathBuf,
    config: CircleConfig,
}

impl Workspace {
    /// Open the nearest workspace
    pub fn open() -> Result<Self> {
        let circle_path = find_circle_path().ok_or(Error::NoWorkspace)?;
        Self::open_at(circle_path)
    }

    /// Open a workspace at a specific path
    pub fn open_at(circle_path: PathBuf) -> Result<Self> {
        if !circle_path.is_dir() {
            return Err(Error::Validation(format!(
                "path does not exist: {}",
                circle_path.display()
            )));
        }

        let config = CircleConfig::new(circle_path.clone());
        Ok(Self {
            circle_path,
            config,
        })
    }

    /// Create a new workspace under `path` and its database schema
    pub fn init(path: &Path) -> Result<Self> {
        let circle_path = path.join(".circle");
        fs::create_dir_all(&circle_path)?;
        SqliteBackend::open(&circle_path.join(DB_FILE))?;
        log::info!("initialized workspace at {}", circle_path.display());

        Self::open_at(circle_path)
    }

    pub fn circle_path(&self) -> &Path {
        &self.circle_path
    }

    pub fn config(&self) -> &CircleConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CircleConfig {
        &mut self.config
    }

    pub fn auth(&self) -> Result<LocalAuth> {
        LocalAuth::open(&self.circle_path)
    }

    /// Build the contact store for the signed-in user
    pub fn contact_store(&self) -> Result<ContactStore> {
        let auth = self.auth()?;
        let owner = auth.require_user()?.id.clone();
        let backend = SqliteBackend::open(&self.circle_path.join(DB_FILE))?;
        ContactStore::load(Box::new(backend), owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AuthProvider;
    use crate::types::{ContactDraft, EngagementCategory, RelationshipCategory};
    use tempfile::TempDir;

    #[test]
    fn test_store_requires_sign_in() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        assert!(matches!(ws.contact_store(), Err(Error::NotSignedIn)));

        let mut auth = ws.auth().unwrap();
        auth.sign_up("ada@example.com", "Ada", "secret-pw").unwrap();

        let mut store = ws.contact_store().unwrap();
        let id = store
            .add(ContactDraft {
                name: "Charles".to_string(),
                relationship: Some(RelationshipCategory::Work),
                ..Default::default()
            })
            .unwrap()
            .id;
        store.log_engagement(&id, EngagementCategory::VideoCall, None).unwrap();

        // A second user sees none of the first user's contacts
        auth.sign_out().unwrap();
        auth.sign_up("bob@example.com", "Bob", "secret-pw").unwrap();
        assert!(ws.contact_store().unwrap().is_empty());

        auth.sign_in("ada@example.com", "secret-pw").unwrap();
        let store = ws.contact_store().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.contacts()[0].engagement_score, 10);
    }
}
