use crate::cli::contacts::short_id;
use crate::error::Result;
use crate::workspace::Workspace;
use chrono::{Datelike, Local};

/// Run the dashboard command - upcoming birthdays and neglected contacts
pub fn run_dashboard() -> Result<()> {
    let ws = Workspace::open()?;
    let store = ws.contact_store()?;

    if store.is_empty() {
        println!("No contacts yet.");
        println!("Get started by adding your first contact: circle add \"Name\" --relationship friend");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let config = ws.config();

    println!("Upcoming Birthdays");
    println!("==================\n");

    let birthdays = store.upcoming_birthdays(today, config.birthday_limit());
    if birthdays.is_empty() {
        println!("  No upcoming birthdays");
    }
    for (c, days) in birthdays {
        let when = match days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };
        if let Some(b) = c.profile.birthday {
            println!(
                "  [{}] {:24} {} {} ({})",
                short_id(&c.id),
                c.name,
                b.format("%B"),
                b.day(),
                when
            );
        }
    }

    println!("\nNeed Attention");
    println!("==============\n");

    let neglected = store.need_attention(config.attention_threshold());
    if neglected.is_empty() {
        println!("  All contacts are well maintained");
    }
    for c in neglected {
        println!(
            "  [{}] {:24} {} {:>3}%",
            short_id(&c.id),
            c.name,
            score_bar(c.engagement_score),
            c.engagement_score
        );
    }

    Ok(())
}

fn score_bar(score: u8) -> String {
    let filled = (score as usize + 5) / 10;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled.min(10)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bar() {
        assert_eq!(score_bar(0), "[..........]");
        assert_eq!(score_bar(47), "[#####.....]");
        assert_eq!(score_bar(100), "[##########]");
    }
}
