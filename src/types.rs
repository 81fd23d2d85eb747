use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of an engagement score
pub const MAX_SCORE: u8 = 100;

/// How a contact relates to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipCategory {
    CloseFriend,
    Friend,
    Work,
    Family,
    Acquaintance,
}

impl RelationshipCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CloseFriend => "close_friend",
            Self::Friend => "friend",
            Self::Work => "work",
            Self::Family => "family",
            Self::Acquaintance => "acquaintance",
        }
    }
}

impl fmt::Display for RelationshipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "close_friend" => Ok(Self::CloseFriend),
            "friend" => Ok(Self::Friend),
            "work" => Ok(Self::Work),
            "family" => Ok(Self::Family),
            "acquaintance" => Ok(Self::Acquaintance),
            other => Err(Error::Validation(format!(
                "unknown relationship '{}' (expected one of: close_friend, friend, work, family, acquaintance)",
                other
            ))),
        }
    }
}

/// Relationship predicate used when listing contacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationshipFilter {
    #[default]
    All,
    Only(RelationshipCategory),
}

impl RelationshipFilter {
    pub fn matches(&self, category: RelationshipCategory) -> bool {
        match self {
            Self::All => true,
            Self::Only(c) => *c == category,
        }
    }
}

impl FromStr for RelationshipFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Kind of interaction logged against a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngagementCategory {
    InPerson,
    VideoCall,
    OnlineMessage,
    Text,
}

impl EngagementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPerson => "in-person",
            Self::VideoCall => "video-call",
            Self::OnlineMessage => "online-message",
            Self::Text => "text",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InPerson => "In Person",
            Self::VideoCall => "Video Call",
            Self::OnlineMessage => "Online Message",
            Self::Text => "Text Message",
        }
    }
}

impl fmt::Display for EngagementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The category set is closed: anything else is rejected rather than mapped.
impl FromStr for EngagementCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "in-person" => Ok(Self::InPerson),
            "video-call" => Ok(Self::VideoCall),
            "online-message" => Ok(Self::OnlineMessage),
            "text" => Ok(Self::Text),
            other => Err(Error::Validation(format!(
                "unknown engagement type '{}' (expected one of: in-person, video-call, online-message, text)",
                other
            ))),
        }
    }
}

/// A logged interaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: String,
    pub contact_id: String,
    pub category: EngagementCategory,
    pub notes: Option<String>,
    pub points: u8,
    pub occurred_at: DateTime<Utc>,
}

/// Optional descriptive fields of a contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub location: Option<String>,
    pub job: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub favorite_movies: Vec<String>,
    #[serde(default)]
    pub favorite_tv_shows: Vec<String>,
    #[serde(default)]
    pub favorite_music_artists: Vec<String>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
    #[serde(default)]
    pub favorite_drinks: Vec<String>,
}

impl ContactProfile {
    /// Trim text fields and drop blank entries
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_text(self.email),
            phone: normalize_text(self.phone),
            birthday: self.birthday,
            location: normalize_text(self.location),
            job: normalize_text(self.job),
            notes: normalize_text(self.notes),
            image_url: normalize_text(self.image_url),
            children: normalize_list(self.children),
            hobbies: normalize_list(self.hobbies),
            favorite_movies: normalize_list(self.favorite_movies),
            favorite_tv_shows: normalize_list(self.favorite_tv_shows),
            favorite_music_artists: normalize_list(self.favorite_music_artists),
            favorite_foods: normalize_list(self.favorite_foods),
            favorite_drinks: normalize_list(self.favorite_drinks),
        }
    }
}

/// A person tracked by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub relationship: RelationshipCategory,
    #[serde(flatten)]
    pub profile: ContactProfile,
    pub engagement_score: u8,
    pub last_engagement: Option<DateTime<Utc>>,
    pub last_engagement_type: Option<EngagementCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Most recent first
    #[serde(default)]
    pub engagements: Vec<Engagement>,
}

/// Input for creating a contact
#[derive(Debug, Clone, Default)]
pub struct ContactDraft {
    pub name: String,
    pub relationship: Option<RelationshipCategory>,
    pub profile: ContactProfile,
}

/// Partial update of a contact.
///
/// Text fields set to a blank string are cleared. The engagement history is
/// not part of a patch; it only grows through logged engagements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub relationship: Option<RelationshipCategory>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<Option<NaiveDate>>,
    pub location: Option<String>,
    pub job: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub children: Option<Vec<String>>,
    pub hobbies: Option<Vec<String>>,
    pub favorite_movies: Option<Vec<String>>,
    pub favorite_tv_shows: Option<Vec<String>>,
    pub favorite_music_artists: Option<Vec<String>>,
    pub favorite_foods: Option<Vec<String>>,
    pub favorite_drinks: Option<Vec<String>>,
    pub engagement_score: Option<u8>,
    pub last_engagement: Option<DateTime<Utc>>,
    pub last_engagement_type: Option<EngagementCategory>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("name cannot be empty".to_string()));
            }
        }
        if let Some(score) = self.engagement_score {
            if score > MAX_SCORE {
                return Err(Error::Validation(format!(
                    "engagement score must be between 0 and {}, got {}",
                    MAX_SCORE, score
                )));
            }
        }
        Ok(())
    }

    /// Merge the provided fields into `contact`
    pub fn apply(&self, contact: &mut Contact, updated_at: DateTime<Utc>) {
        if let Some(name) = &self.name {
            contact.name = name.trim().to_string();
        }
        if let Some(relationship) = self.relationship {
            contact.relationship = relationship;
        }

        let profile = &mut contact.profile;
        merge_text(&mut profile.email, &self.email);
        merge_text(&mut profile.phone, &self.phone);
        if let Some(birthday) = self.birthday {
            profile.birthday = birthday;
        }
        merge_text(&mut profile.location, &self.location);
        merge_text(&mut profile.job, &self.job);
        merge_text(&mut profile.notes, &self.notes);
        merge_text(&mut profile.image_url, &self.image_url);
        merge_list(&mut profile.children, &self.children);
        merge_list(&mut profile.hobbies, &self.hobbies);
        merge_list(&mut profile.favorite_movies, &self.favorite_movies);
        merge_list(&mut profile.favorite_tv_shows, &self.favorite_tv_shows);
        merge_list(&mut profile.favorite_music_artists, &self.favorite_music_artists);
        merge_list(&mut profile.favorite_foods, &self.favorite_foods);
        merge_list(&mut profile.favorite_drinks, &self.favorite_drinks);

        if let Some(score) = self.engagement_score {
            contact.engagement_score = score.min(MAX_SCORE);
        }
        if let Some(at) = self.last_engagement {
            contact.last_engagement = Some(at);
        }
        if let Some(category) = self.last_engagement_type {
            contact.last_engagement_type = Some(category);
        }
        contact.updated_at = updated_at;
    }
}

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn normalize_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a comma-separated CLI value into list entries
pub fn split_list(value: &str) -> Vec<String> {
    normalize_list(value.split(',').map(str::to_string).collect())
}

fn merge_text(field: &mut Option<String>, update: &Option<String>) {
    if let Some(value) = update {
        *field = normalize_text(Some(value.clone()));
    }
}

fn merge_list(field: &mut Vec<String>, update: &Option<Vec<String>>) {
    if let Some(values) = update {
        *field = normalize_list(values.clone());
    }
}
