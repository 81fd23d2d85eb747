use crate::error::{Error, Result};
use crate::scoring::{apply_points, points_for};
use crate::types::{normalize_text, Contact, Engagement, EngagementCategory};
use chrono::{DateTime, Utc};

/// Output of recording an engagement: the new record and the contact as it
/// should look afterwards
#[derive(Debug, Clone)]
pub struct RecordedEngagement {
    pub engagement: Engagement,
    pub contact: Contact,
}

/// Record an engagement against `contact` without touching any storage
pub fn record_engagement(
    contact: &Contact,
    category: EngagementCategory,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> RecordedEngagement {
    let points = points_for(category);

    let engagement = Engagement {
        id: uuid::Uuid::new_v4().to_string(),
        contact_id: contact.id.clone(),
        category,
        notes: normalize_text(notes.map(str::to_string)),
        points,
        occurred_at: now,
    };

    let mut updated = contact.clone();
    updated.engagement_score = apply_points(contact.engagement_score, points);
    updated.last_engagement = Some(now);
    updated.last_engagement_type = Some(category);
    updated.updated_at = now;
    updated.engagements.insert(0, engagement.clone());

    RecordedEngagement {
        engagement,
        contact: updated,
    }
}

/// Look `id` up in `contacts` and record against it
pub fn record_for(
    contacts: &[Contact],
    id: &str,
    category: EngagementCategory,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RecordedEngagement> {
    let contact = contacts
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::NotFound(format!("contact {}", id)))?;

    Ok(record_engagement(contact, category, notes, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContactProfile, RelationshipCategory};
    use chrono::Duration;

    fn contact(score: u8) -> Contact {
        let now = Utc::now();
        Contact {
            id: "c1".to_string(),
            name: "John Smith".to_string(),
            relationship: RelationshipCategory::Friend,
            profile: ContactProfile::default(),
            engagement_score: score,
            last_engagement: None,
            last_engagement_type: None,
            created_at: now,
            updated_at: now,
            engagements: Vec::new(),
        }
    }

    #[test]
    fn test_record_sets_points_and_last_engagement() {
        let now = Utc::now();
        let recorded = record_engagement(&contact(20), EngagementCategory::VideoCall, Some(" catch-up "), now);

        assert_eq!(recorded.engagement.points, 10);
        assert_eq!(recorded.engagement.contact_id, "c1");
        assert_eq!(recorded.engagement.notes.as_deref(), Some("catch-up"));
        assert_eq!(recorded.contact.engagement_score, 30);
        assert_eq!(recorded.contact.last_engagement, Some(now));
        assert_eq!(recorded.contact.last_engagement_type, Some(EngagementCategory::VideoCall));
        assert_eq!(recorded.contact.engagements, vec![recorded.engagement.clone()]);
    }

    #[test]
    fn test_record_clamps_at_ceiling() {
        let recorded = record_engagement(&contact(95), EngagementCategory::InPerson, None, Utc::now());
        assert_eq!(recorded.contact.engagement_score, 100);
        assert_eq!(recorded.engagement.points, 15);
    }

    #[test]
    fn test_record_prepends_history() {
        let start = Utc::now();
        let mut current = contact(0);
        let mut ids = Vec::new();

        for (i, category) in [
            EngagementCategory::Text,
            EngagementCategory::OnlineMessage,
            EngagementCategory::InPerson,
        ]
        .into_iter()
        .enumerate()
        {
            let recorded = record_engagement(&current, category, None, start + Duration::minutes(i as i64));
            ids.push(recorded.engagement.id.clone());
            current = recorded.contact;
        }

        let history: Vec<_> = current.engagements.iter().map(|e| e.id.clone()).collect();
        ids.reverse();
        assert_eq!(history, ids);
        assert_eq!(current.last_engagement_type, Some(EngagementCategory::InPerson));
        assert_eq!(current.engagement_score, 23);
    }

    #[test]
    fn test_record_leaves_input_untouched() {
        let original = contact(40);
        let _ = record_engagement(&original, EngagementCategory::Text, None, Utc::now());
        assert_eq!(original.engagement_score, 40);
        assert!(original.engagements.is_empty());
    }

    #[test]
    fn test_record_for_unknown_contact() {
        let contacts = vec![contact(10)];
        let result = record_for(&contacts, "missing", EngagementCategory::Text, None, Utc::now());
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(contacts[0].engagement_score, 10);
    }
}
