use crate::backend::Persistence;
use crate::error::{Error, Result};
use crate::recorder::record_for;
use crate::types::{
    Contact, ContactDraft, ContactPatch, Engagement, EngagementCategory, RelationshipFilter,
};
use chrono::{Datelike, NaiveDate, Utc};

/// In-memory view of one user's contacts, kept in sync with a persistence
/// backend
pub struct ContactStore {
    backend: Box<dyn Persistence>,
    owner: String,
    contacts: Vec<Contact>,
    search_query: String,
    relationship_filter: RelationshipFilter,
}

impl ContactStore {
    /// Create an empty store for `owner` without reading the backend
    pub fn new(backend: Box<dyn Persistence>, owner: impl Into<String>) -> Self {
        Self {
            backend,
            owner: owner.into(),
            contacts: Vec::new(),
            search_query: String::new(),
            relationship_filter: RelationshipFilter::All,
        }
    }

    /// Create a store for `owner` and fetch its contacts
    pub fn load(backend: Box<dyn Persistence>, owner: impl Into<String>) -> Result<Self> {
        let mut store = Self::new(backend, owner);
        store.fetch()?;
        Ok(store)
    }

    /// Replace the in-memory contacts with the backend's copy
    pub fn fetch(&mut self) -> Result<()> {
        let contacts = self.backend.select_contacts(&self.owner).map_err(|e| {
            log::error!("failed to fetch contacts: {}", e);
            e
        })?;
        log::debug!("fetched {} contacts for {}", contacts.len(), self.owner);
        self.contacts = contacts;
        Ok(())
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a contact from a draft. Nothing is written if validation fails.
    pub fn add(&mut self, draft: ContactDraft) -> Result<Contact> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        let relationship = draft
            .relationship
            .ok_or_else(|| Error::Validation("relationship is required".to_string()))?;

        let now = Utc::now();
        let contact = Contact {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            relationship,
            profile: draft.profile.normalized(),
            engagement_score: 0,
            last_engagement: None,
            last_engagement_type: None,
            created_at: now,
            updated_at: now,
            engagements: Vec::new(),
        };

        self.backend
            .insert_contact(&self.owner, &contact)
            .map_err(|e| {
                log::error!("failed to add contact: {}", e);
                e
            })?;

        log::info!("added contact {}", contact.id);
        self.contacts.push(contact.clone());
        Ok(contact)
    }

    /// Merge `patch` into an existing contact
    pub fn update(&mut self, id: &str, patch: &ContactPatch) -> Result<Contact> {
        patch.validate()?;
        let index = self.position(id)?;

        let now = Utc::now();
        self.backend.update_contact(id, patch, now).map_err(|e| {
            log::error!("failed to update contact {}: {}", id, e);
            e
        })?;

        let contact = &mut self.contacts[index];
        patch.apply(contact, now);
        log::info!("updated contact {}", id);
        Ok(contact.clone())
    }

    /// Log an interaction with a contact and raise its engagement score.
    ///
    /// This issues two separate backend writes: the engagement insert, then
    /// the contact's score update. They are not atomic. If the insert
    /// succeeds and the update fails, the engagement stays persisted while
    /// the contact row and the in-memory state keep the old score, and the
    /// call returns [`Error::PartialWrite`]. Concurrent calls for the same
    /// contact can also read the same stale score; the last writer wins.
    pub fn log_engagement(
        &mut self,
        id: &str,
        category: EngagementCategory,
        notes: Option<&str>,
    ) -> Result<Engagement> {
        let recorded = record_for(&self.contacts, id, category, notes, Utc::now())?;
        let engagement = recorded.engagement;
        let updated = recorded.contact;

        self.backend.insert_engagement(&engagement).map_err(|e| {
            log::error!("failed to save engagement for {}: {}", id, e);
            e
        })?;

        let patch = ContactPatch {
            engagement_score: Some(updated.engagement_score),
            last_engagement: updated.last_engagement,
            last_engagement_type: updated.last_engagement_type,
            ..Default::default()
        };
        if let Err(e) = self.backend.update_contact(id, &patch, updated.updated_at) {
            log::error!(
                "engagement {} saved but contact {} was not updated: {}",
                engagement.id,
                id,
                e
            );
            return Err(Error::PartialWrite {
                engagement_id: engagement.id,
                source: Box::new(e),
            });
        }

        let index = self.position(id)?;
        self.contacts[index] = updated;
        log::info!(
            "logged {} with {} (+{})",
            category,
            id,
            engagement.points
        );
        Ok(engagement)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Case-insensitive substring match on name, in store order
    pub fn search(&self, query: &str) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| name_matches(c, query))
            .collect()
    }

    pub fn filter_by_relationship(&self, filter: RelationshipFilter) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| filter.matches(c.relationship))
            .collect()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_relationship_filter(&mut self, filter: RelationshipFilter) {
        self.relationship_filter = filter;
    }

    /// Contacts matching both the current search query and relationship filter
    pub fn filtered(&self) -> Vec<&Contact> {
        let in_category = self.filter_by_relationship(self.relationship_filter);
        self.search(&self.search_query)
            .into_iter()
            .filter(|c| in_category.iter().any(|r| r.id == c.id))
            .collect()
    }

    /// Contacts with a birthday, soonest next anniversary first
    pub fn upcoming_birthdays(&self, today: NaiveDate, limit: usize) -> Vec<(&Contact, i64)> {
        let mut upcoming: Vec<(&Contact, i64)> = self
            .contacts
            .iter()
            .filter_map(|c| {
                c.profile
                    .birthday
                    .map(|b| (c, days_until_birthday(b, today)))
            })
            .collect();

        upcoming.sort_by_key(|(_, days)| *days);
        upcoming.truncate(limit);
        upcoming
    }

    /// Contacts at or below `threshold`, lowest score first
    pub fn need_attention(&self, threshold: u8) -> Vec<&Contact> {
        let mut contacts: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|c| c.engagement_score <= threshold)
            .collect();
        contacts.sort_by_key(|c| c.engagement_score);
        contacts
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("contact {}", id)))
    }
}

fn name_matches(contact: &Contact, query: &str) -> bool {
    contact
        .name
        .to_lowercase()
        .contains(&query.to_lowercase())
}

/// Days from `today` to the next anniversary of `birthday` (0 if today)
pub fn days_until_birthday(birthday: NaiveDate, today: NaiveDate) -> i64 {
    let this_year = anniversary(birthday, today.year());
    let next = if this_year < today {
        anniversary(birthday, today.year() + 1)
    } else {
        this_year
    };
    (next - today).num_days()
}

// 29 February falls back to 28 February outside leap years
fn anniversary(birthday: NaiveDate, year: i32) -> NaiveDate {
    birthday
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, birthday.month(), 28))
        .unwrap_or(birthday)
}
