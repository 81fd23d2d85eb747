use crate::error::{Error, Result};
use crate::store::ContactStore;
use crate::types::{
    split_list, Contact, ContactDraft, ContactPatch, ContactProfile, EngagementCategory,
    RelationshipCategory, RelationshipFilter,
};
use crate::workspace::Workspace;
use chrono::NaiveDate;
use clap::Args;
use std::path::Path;

/// Optional contact fields shared by `add` and `edit`
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Birthday (YYYY-MM-DD, empty to clear)
    #[arg(long)]
    pub birthday: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub job: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,

    /// Comma-separated names
    #[arg(long)]
    pub children: Option<String>,

    /// Comma-separated
    #[arg(long)]
    pub hobbies: Option<String>,

    /// Comma-separated
    #[arg(long)]
    pub movies: Option<String>,

    /// Comma-separated
    #[arg(long)]
    pub tv_shows: Option<String>,

    /// Comma-separated
    #[arg(long)]
    pub music: Option<String>,

    /// Comma-separated
    #[arg(long)]
    pub foods: Option<String>,

    /// Comma-separated
    #[arg(long)]
    pub drinks: Option<String>,
}

impl ProfileArgs {
    fn into_profile(self) -> Result<ContactProfile> {
        let list = |v: Option<String>| v.as_deref().map(split_list).unwrap_or_default();

        Ok(ContactProfile {
            email: self.email,
            phone: self.phone,
            birthday: match self.birthday.as_deref() {
                Some(b) => parse_birthday(b)?,
                None => None,
            },
            location: self.location,
            job: self.job,
            notes: self.notes,
            image_url: self.image_url,
            children: list(self.children),
            hobbies: list(self.hobbies),
            favorite_movies: list(self.movies),
            favorite_tv_shows: list(self.tv_shows),
            favorite_music_artists: list(self.music),
            favorite_foods: list(self.foods),
            favorite_drinks: list(self.drinks),
        }
        .normalized())
    }

    fn into_patch(self, name: Option<String>, relationship: Option<RelationshipCategory>) -> Result<ContactPatch> {
        let list = |v: Option<String>| v.as_deref().map(split_list);

        Ok(ContactPatch {
            name,
            relationship,
            email: self.email,
            phone: self.phone,
            birthday: self.birthday.as_deref().map(parse_birthday).transpose()?,
            location: self.location,
            job: self.job,
            notes: self.notes,
            image_url: self.image_url,
            children: list(self.children),
            hobbies: list(self.hobbies),
            favorite_movies: list(self.movies),
            favorite_tv_shows: list(self.tv_shows),
            favorite_music_artists: list(self.music),
            favorite_foods: list(self.foods),
            favorite_drinks: list(self.drinks),
            ..Default::default()
        })
    }
}

/// Run the init command
pub fn run_init(path: &str) -> Result<()> {
    let path = Path::new(path);
    let circle_path = path.join(".circle");

    if circle_path.exists() {
        return Err(Error::Validation(format!(
            ".circle already exists at {}",
            circle_path.display()
        )));
    }

    let ws = Workspace::init(path)?;
    println!("Initialized .circle at {}", ws.circle_path().display());
    println!("Create an account with: circle signup <email>");

    Ok(())
}

/// Run the add command
pub fn run_add(name: &str, relationship: Option<&str>, profile: ProfileArgs) -> Result<()> {
    let mut store = Workspace::open()?.contact_store()?;

    let draft = ContactDraft {
        name: name.to_string(),
        relationship: relationship.map(str::parse).transpose()?,
        profile: profile.into_profile()?,
    };
    let contact = store.add(draft)?;

    println!("Added [{}] {}", short_id(&contact.id), contact.name);
    println!("  relationship: {}", contact.relationship);

    Ok(())
}

/// Run the edit command
pub fn run_edit(
    id: &str,
    name: Option<String>,
    relationship: Option<&str>,
    score: Option<u8>,
    profile: ProfileArgs,
) -> Result<()> {
    let mut store = Workspace::open()?.contact_store()?;
    let id = resolve_id(&store, id)?;

    let mut patch = profile.into_patch(name, relationship.map(str::parse).transpose()?)?;
    patch.engagement_score = score;
    if patch.is_empty() {
        return Err(Error::Validation("nothing to update".to_string()));
    }

    let contact = store.update(&id, &patch)?;
    println!("Updated [{}] {}", short_id(&contact.id), contact.name);

    Ok(())
}

/// Run the show command
pub fn run_show(id: &str) -> Result<()> {
    let store = Workspace::open()?.contact_store()?;
    let id = resolve_id(&store, id)?;
    let contact = store
        .get(&id)
        .ok_or_else(|| Error::NotFound(format!("contact {}", id)))?;

    print_contact_detail(contact);
    Ok(())
}

/// Run the list command
pub fn run_list(search: Option<&str>, relationship: Option<&str>) -> Result<()> {
    let mut store = Workspace::open()?.contact_store()?;

    if let Some(q) = search {
        store.set_search_query(q);
    }
    if let Some(r) = relationship {
        store.set_relationship_filter(r.parse::<RelationshipFilter>()?);
    }

    let contacts = store.filtered();
    if contacts.is_empty() {
        if store.is_empty() {
            println!("No contacts yet. Add one with: circle add \"Name\" --relationship friend");
        } else {
            println!("No matching contacts.");
        }
        return Ok(());
    }

    let shown = contacts.len();
    for c in contacts {
        print_contact(c);
    }
    println!("\n{} of {} contacts", shown, store.len());

    Ok(())
}

/// Run the log command
pub fn run_log(id: &str, category: &str, notes: Option<&str>) -> Result<()> {
    let category: EngagementCategory = category.parse()?;
    let mut store = Workspace::open()?.contact_store()?;
    let id = resolve_id(&store, id)?;

    let engagement = store.log_engagement(&id, category, notes)?;
    let score = store.get(&id).map(|c| c.engagement_score).unwrap_or_default();

    println!(
        "Logged {} (+{}) [{}]",
        category.label(),
        engagement.points,
        short_id(&engagement.id)
    );
    println!("  score: {}%", score);

    Ok(())
}

/// Run the export command
pub fn run_export(format: &str) -> Result<()> {
    let store = Workspace::open()?.contact_store()?;
    let contacts = store.contacts();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(contacts)?);
        }
        "md" => {
            for c in contacts {
                println!("## {} ({})", c.name, c.relationship);
                println!("*Score: {}%*\n", c.engagement_score);
                for (label, value) in profile_lines(&c.profile) {
                    println!("- **{}:** {}", label, value);
                }
                if !c.engagements.is_empty() {
                    println!("\n### Engagements\n");
                    for e in &c.engagements {
                        println!(
                            "- {} {} (+{}){}",
                            e.occurred_at.format("%Y-%m-%d"),
                            e.category.label(),
                            e.points,
                            e.notes.as_deref().map(|n| format!(": {}", n)).unwrap_or_default()
                        );
                    }
                }
                println!("\n---\n");
            }
        }
        _ => {
            return Err(Error::Validation(format!("Unknown format: {}", format)));
        }
    }

    Ok(())
}

/// Resolve a full id or a unique id prefix
pub fn resolve_id(store: &ContactStore, id: &str) -> Result<String> {
    if store.get(id).is_some() {
        return Ok(id.to_string());
    }

    let matches: Vec<&Contact> = store
        .contacts()
        .iter()
        .filter(|c| c.id.starts_with(id))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(Error::NotFound(format!("contact {}", id))),
        _ => Err(Error::NotFound(format!(
            "'{}' matches {} contacts, use a longer id",
            id,
            matches.len()
        ))),
    }
}

fn parse_birthday(value: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::Validation(format!("birthday must be YYYY-MM-DD, got '{}'", value)))
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_contact(c: &Contact) {
    println!(
        "[{}] {}  ({}, score: {}%)",
        short_id(&c.id),
        c.name,
        c.relationship,
        c.engagement_score
    );
    if let Some(last) = c.last_engagement {
        let kind = c.last_engagement_type.map(|t| t.label()).unwrap_or("-");
        println!("    last: {} {}", last.format("%Y-%m-%d"), kind);
    }
}

fn print_contact_detail(c: &Contact) {
    println!("{}", c.name);
    println!("{}\n", "=".repeat(c.name.chars().count()));

    println!("ID:           {}", c.id);
    println!("Relationship: {}", c.relationship);
    println!("Score:        {}%", c.engagement_score);
    for (label, value) in profile_lines(&c.profile) {
        println!("{:13} {}", format!("{}:", label), value);
    }

    if c.engagements.is_empty() {
        println!("\nNo engagements yet.");
        return;
    }

    println!("\nEngagements:\n");
    for e in &c.engagements {
        println!(
            "  {}  {:15} +{:<3} {}",
            e.occurred_at.format("%Y-%m-%d %H:%M"),
            e.category.label(),
            e.points,
            e.notes.as_deref().unwrap_or("")
        );
    }
}

fn profile_lines(p: &ContactProfile) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();
    let text = [
        ("Email", &p.email),
        ("Phone", &p.phone),
        ("Location", &p.location),
        ("Job", &p.job),
        ("Notes", &p.notes),
        ("Image", &p.image_url),
    ];
    for (label, value) in text {
        if let Some(v) = value {
            lines.push((label, v.replace('\n', " ")));
        }
    }
    if let Some(b) = p.birthday {
        lines.push(("Birthday", b.format("%B %-d, %Y").to_string()));
    }

    let lists = [
        ("Children", &p.children),
        ("Hobbies", &p.hobbies),
        ("Movies", &p.favorite_movies),
        ("TV shows", &p.favorite_tv_shows),
        ("Music", &p.favorite_music_artists),
        ("Foods", &p.favorite_foods),
        ("Drinks", &p.favorite_drinks),
    ];
    for (label, values) in lists {
        if !values.is_empty() {
            lines.push((label, values.join(", ")));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteBackend;

    fn store_with(names: &[&str]) -> ContactStore {
        let mut store = ContactStore::new(Box::new(SqliteBackend::in_memory().unwrap()), "u1");
        for name in names {
            store
                .add(ContactDraft {
                    name: name.to_string(),
                    relationship: Some(RelationshipCategory::Friend),
                    ..Default::default()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_resolve_id_prefix() {
        let store = store_with(&["Ana"]);
        let id = store.contacts()[0].id.clone();

        assert_eq!(resolve_id(&store, &id).unwrap(), id);
        assert_eq!(resolve_id(&store, &id[..6]).unwrap(), id);
        assert!(matches!(resolve_id(&store, "zzzz-none"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_resolve_id_ambiguous() {
        let store = store_with(&["Ana", "Ben"]);
        assert!(matches!(resolve_id(&store, ""), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_profile_args_into_patch() {
        let args = ProfileArgs {
            birthday: Some("".to_string()),
            hobbies: Some("golf, tennis".to_string()),
            ..Default::default()
        };
        let patch = args.into_patch(None, None).unwrap();
        assert_eq!(patch.birthday, Some(None));
        assert_eq!(patch.hobbies, Some(vec!["golf".to_string(), "tennis".to_string()]));
        assert!(patch.email.is_none());
    }

    #[test]
    fn test_bad_birthday_rejected() {
        let args = ProfileArgs {
            birthday: Some("12/04/1990".to_string()),
            ..Default::default()
        };
        assert!(matches!(args.into_profile(), Err(Error::Validation(_))));
    }
}
