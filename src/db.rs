use crate::backend::Persistence;
use crate::error::{Error, Result};
use crate::types::{
    normalize_list, normalize_text, Contact, ContactPatch, ContactProfile, Engagement,
    EngagementCategory,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

pub const DB_FILE: &str = "circle.db";

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    salt TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    relationship TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    birthday TEXT,
    location TEXT,
    job TEXT,
    notes TEXT,
    image_url TEXT,
    children TEXT NOT NULL DEFAULT '[]',
    hobbies TEXT NOT NULL DEFAULT '[]',
    favorite_movies TEXT NOT NULL DEFAULT '[]',
    favorite_tv_shows TEXT NOT NULL DEFAULT '[]',
    favorite_music_artists TEXT NOT NULL DEFAULT '[]',
    favorite_foods TEXT NOT NULL DEFAULT '[]',
    favorite_drinks TEXT NOT NULL DEFAULT '[]',
    engagement_score INTEGER NOT NULL DEFAULT 0 CHECK (engagement_score BETWEEN 0 AND 100),
    last_engagement TEXT,
    last_engagement_type TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contacts_user ON contacts(user_id);

CREATE TABLE IF NOT EXISTS engagements (
    id TEXT PRIMARY KEY,
    contact_id TEXT NOT NULL,
    category TEXT NOT NULL,
    notes TEXT,
    points INTEGER NOT NULL,
    occurred_at TEXT NOT NULL,
    FOREIGN KEY (contact_id) REFERENCES contacts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_engagements_contact ON engagements(contact_id);
"#;

/// Open a connection and make sure the schema exists
pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
#[cfg(test)]
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Contact persistence backed by SQLite
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_connection(db_path)?,
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: open_in_memory()?,
        })
    }

    fn engagements_for(&self, contact_id: &str) -> rusqlite::Result<Vec<Engagement>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, category, notes, points, occurred_at
             FROM engagements
             WHERE contact_id = ?1
             ORDER BY occurred_at DESC, rowid DESC",
        )?;

        let engagements = stmt
            .query_map(params![contact_id], row_to_engagement)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(engagements)
    }
}

impl Persistence for SqliteBackend {
    fn select_contacts(&self, owner: &str) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM contacts WHERE user_id = ?1 ORDER BY name COLLATE NOCASE, created_at",
        )?;

        let mut contacts = stmt
            .query_map(params![owner], row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for contact in &mut contacts {
            contact.engagements = self.engagements_for(&contact.id)?;
        }

        Ok(contacts)
    }

    fn insert_contact(&self, owner: &str, contact: &Contact) -> Result<()> {
        let p = &contact.profile;
        self.conn.execute(
            r#"INSERT INTO contacts (
                id, user_id, name, relationship, email, phone, birthday, location, job,
                notes, image_url, children, hobbies, favorite_movies, favorite_tv_shows,
                favorite_music_artists, favorite_foods, favorite_drinks, engagement_score,
                last_engagement, last_engagement_type, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                contact.id,
                owner,
                contact.name,
                contact.relationship.as_str(),
                p.email,
                p.phone,
                p.birthday.map(format_date),
                p.location,
                p.job,
                p.notes,
                p.image_url,
                list_json(&p.children)?,
                list_json(&p.hobbies)?,
                list_json(&p.favorite_movies)?,
                list_json(&p.favorite_tv_shows)?,
                list_json(&p.favorite_music_artists)?,
                list_json(&p.favorite_foods)?,
                list_json(&p.favorite_drinks)?,
                contact.engagement_score,
                contact.last_engagement.map(format_timestamp),
                contact.last_engagement_type.map(|t| t.as_str()),
                format_timestamp(contact.created_at),
                format_timestamp(contact.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update_contact(&self, id: &str, patch: &ContactPatch, updated_at: DateTime<Utc>) -> Result<()> {
        let mut sets: Vec<(&str, Value)> = Vec::new();

        if let Some(name) = &patch.name {
            sets.push(("name", Value::Text(name.trim().to_string())));
        }
        if let Some(relationship) = patch.relationship {
            sets.push(("relationship", Value::Text(relationship.as_str().to_string())));
        }

        let texts = [
            ("email", &patch.email),
            ("phone", &patch.phone),
            ("location", &patch.location),
            ("job", &patch.job),
            ("notes", &patch.notes),
            ("image_url", &patch.image_url),
        ];
        for (column, value) in texts {
            if let Some(v) = value {
                sets.push((column, text_value(normalize_text(Some(v.clone())))));
            }
        }

        if let Some(birthday) = patch.birthday {
            sets.push(("birthday", text_value(birthday.map(format_date))));
        }

        let lists = [
            ("children", &patch.children),
            ("hobbies", &patch.hobbies),
            ("favorite_movies", &patch.favorite_movies),
            ("favorite_tv_shows", &patch.favorite_tv_shows),
            ("favorite_music_artists", &patch.favorite_music_artists),
            ("favorite_foods", &patch.favorite_foods),
            ("favorite_drinks", &patch.favorite_drinks),
        ];
        for (column, value) in lists {
            if let Some(v) = value {
                sets.push((column, Value::Text(list_json(&normalize_list(v.clone()))?)));
            }
        }

        if let Some(score) = patch.engagement_score {
            sets.push(("engagement_score", Value::Integer(score as i64)));
        }
        if let Some(at) = patch.last_engagement {
            sets.push(("last_engagement", Value::Text(format_timestamp(at))));
        }
        if let Some(category) = patch.last_engagement_type {
            sets.push(("last_engagement_type", Value::Text(category.as_str().to_string())));
        }
        sets.push(("updated_at", Value::Text(format_timestamp(updated_at))));

        let assignments = sets
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE contacts SET {} WHERE id = ?", assignments);

        let mut values: Vec<Value> = sets.into_iter().map(|(_, v)| v).collect();
        values.push(Value::Text(id.to_string()));

        let count = self.conn.execute(&sql, params_from_iter(values))?;
        if count == 0 {
            return Err(Error::NotFound(format!("contact {}", id)));
        }
        Ok(())
    }

    fn insert_engagement(&self, engagement: &Engagement) -> Result<()> {
        self.conn.execute(
            "INSERT INTO engagements (id, contact_id, category, notes, points, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                engagement.id,
                engagement.contact_id,
                engagement.category.as_str(),
                engagement.notes,
                engagement.points,
                format_timestamp(engagement.occurred_at),
            ],
        )?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Column conversions
// -----------------------------------------------------------------------------

/// Fixed-width RFC 3339 so that text ordering matches time ordering
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn text_value(value: Option<String>) -> Value {
    value.map(Value::Text).unwrap_or(Value::Null)
}

fn list_json(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_timestamp(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    parse_timestamp(idx, &raw)
}

fn get_opt_timestamp(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let idx = row.as_ref().column_index(column)?;
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_timestamp(idx, &s)).transpose()
}

fn get_list(row: &Row, column: &str) -> rusqlite::Result<Vec<String>> {
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn get_parsed<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
    let birthday_idx = row.as_ref().column_index("birthday")?;
    let birthday = row
        .get::<_, Option<String>>(birthday_idx)?
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| conversion_error(birthday_idx, e))?;

    let last_type_idx = row.as_ref().column_index("last_engagement_type")?;
    let last_engagement_type: Option<EngagementCategory> = row
        .get::<_, Option<String>>(last_type_idx)?
        .map(|s| s.parse())
        .transpose()
        .map_err(|e| conversion_error(last_type_idx, e))?;

    Ok(Contact {
        id: row.get("id")?,
        name: row.get("name")?,
        relationship: get_parsed(row, "relationship")?,
        profile: ContactProfile {
            email: row.get("email")?,
            phone: row.get("phone")?,
            birthday,
            location: row.get("location")?,
            job: row.get("job")?,
            notes: row.get("notes")?,
            image_url: row.get("image_url")?,
            children: get_list(row, "children")?,
            hobbies: get_list(row, "hobbies")?,
            favorite_movies: get_list(row, "favorite_movies")?,
            favorite_tv_shows: get_list(row, "favorite_tv_shows")?,
            favorite_music_artists: get_list(row, "favorite_music_artists")?,
            favorite_foods: get_list(row, "favorite_foods")?,
            favorite_drinks: get_list(row, "favorite_drinks")?,
        },
        engagement_score: row.get("engagement_score")?,
        last_engagement: get_opt_timestamp(row, "last_engagement")?,
        last_engagement_type,
        created_at: get_timestamp(row, "created_at")?,
        updated_at: get_timestamp(row, "updated_at")?,
        engagements: Vec::new(),
    })
}

fn row_to_engagement(row: &Row) -> rusqlite::Result<Engagement> {
    Ok(Engagement {
        id: row.get("id")?,
        contact_id: row.get("contact_id")?,
        category: get_parsed(row, "category")?,
        notes: row.get("notes")?,
        points: row.get("points")?,
        occurred_at: get_timestamp(row, "occurred_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationshipCategory;
    use chrono::Duration;

    fn sample(id: &str, name: &str) -> Contact {
        let now = Utc::now();
        Contact {
            id: id.to_string(),
            name: name.to_string(),
            relationship: RelationshipCategory::Work,
            profile: ContactProfile {
                email: Some("a@example.com".to_string()),
                birthday: NaiveDate::from_ymd_opt(1990, 4, 12),
                hobbies: vec!["climbing".to_string(), "chess".to_string()],
                ..Default::default()
            },
            engagement_score: 0,
            last_engagement: None,
            last_engagement_type: None,
            created_at: now,
            updated_at: now,
            engagements: Vec::new(),
        }
    }

    fn engagement(id: &str, contact_id: &str, at: DateTime<Utc>) -> Engagement {
        Engagement {
            id: id.to_string(),
            contact_id: contact_id.to_string(),
            category: EngagementCategory::Text,
            notes: None,
            points: 3,
            occurred_at: at,
        }
    }

    #[test]
    fn test_insert_and_select() {
        let db = SqliteBackend::in_memory().unwrap();
        db.insert_contact("u1", &sample("c2", "zoe")).unwrap();
        db.insert_contact("u1", &sample("c1", "Adam")).unwrap();
        db.insert_contact("u2", &sample("c3", "Someone else")).unwrap();

        let contacts = db.select_contacts("u1").unwrap();
        let names: Vec<_> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Adam", "zoe"]);

        let adam = &contacts[0];
        assert_eq!(adam.profile.email.as_deref(), Some("a@example.com"));
        assert_eq!(adam.profile.birthday, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert_eq!(adam.profile.hobbies, vec!["climbing", "chess"]);
        assert_eq!(adam.relationship, RelationshipCategory::Work);
    }

    #[test]
    fn test_engagements_most_recent_first() {
        let db = SqliteBackend::in_memory().unwrap();
        db.insert_contact("u1", &sample("c1", "Adam")).unwrap();

        let start = Utc::now();
        db.insert_engagement(&engagement("e1", "c1", start)).unwrap();
        db.insert_engagement(&engagement("e2", "c1", start + Duration::seconds(5))).unwrap();
        db.insert_engagement(&engagement("e3", "c1", start + Duration::seconds(5))).unwrap();

        let contacts = db.select_contacts("u1").unwrap();
        let ids: Vec<_> = contacts[0].engagements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e2", "e1"]);
    }

    #[test]
    fn test_partial_update() {
        let db = SqliteBackend::in_memory().unwrap();
        db.insert_contact("u1", &sample("c1", "Adam")).unwrap();

        let at = Utc::now();
        let patch = ContactPatch {
            job: Some("Engineer".to_string()),
            email: Some("".to_string()),
            engagement_score: Some(42),
            last_engagement: Some(at),
            last_engagement_type: Some(EngagementCategory::VideoCall),
            ..Default::default()
        };
        db.update_contact("c1", &patch, at).unwrap();

        let contact = db.select_contacts("u1").unwrap().remove(0);
        assert_eq!(contact.name, "Adam");
        assert_eq!(contact.profile.job.as_deref(), Some("Engineer"));
        assert_eq!(contact.profile.email, None);
        assert_eq!(contact.profile.hobbies, vec!["climbing", "chess"]);
        assert_eq!(contact.engagement_score, 42);
        assert_eq!(contact.last_engagement_type, Some(EngagementCategory::VideoCall));
        assert_eq!(contact.last_engagement.map(format_timestamp), Some(format_timestamp(at)));
    }

    #[test]
    fn test_update_unknown_contact() {
        let db = SqliteBackend::in_memory().unwrap();
        let result = db.update_contact("nope", &ContactPatch::default(), Utc::now());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_engagement_requires_contact() {
        let db = SqliteBackend::in_memory().unwrap();
        let result = db.insert_engagement(&engagement("e1", "missing", Utc::now()));
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_score_range_enforced() {
        let db = SqliteBackend::in_memory().unwrap();
        db.insert_contact("u1", &sample("c1", "Adam")).unwrap();
        let result = db.conn.execute("UPDATE contacts SET engagement_score = 120 WHERE id = 'c1'", []);
        assert!(result.is_err());
    }
}
