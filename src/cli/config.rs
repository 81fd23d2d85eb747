use crate::config::KNOWN_KEYS;
use crate::error::{Error, Result};
use crate::workspace::Workspace;

/// Run the config command
pub fn run_config(key: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut ws = Workspace::open()?;

    match (key, value) {
        (None, None) => {
            // Show current config
            println!("Current configuration:\n");

            let config = ws.config();
            let effective = [
                ("attention_threshold", config.attention_threshold().to_string()),
                ("birthday_limit", config.birthday_limit().to_string()),
            ];
            for (k, v) in effective {
                println!("  {:20} {}", k, v);
            }

            for (k, v) in config.entries() {
                if !KNOWN_KEYS.iter().any(|known| known.name == k) {
                    println!("  {:20} {}", k, v);
                }
            }

            println!("\nAvailable keys:\n");
            for known in KNOWN_KEYS {
                println!("  {:20} {} (default {})", known.name, known.description, known.default);
            }
        }
        (Some(k), None) => {
            // Show specific key
            let config = ws.config();
            match k {
                "attention_threshold" => println!("{}: {}", k, config.attention_threshold()),
                "birthday_limit" => println!("{}: {}", k, config.birthday_limit()),
                _ => match config.get(k) {
                    Some(v) => println!("{}: {}", k, v),
                    None => println!("{}: (not set)", k),
                },
            }
        }
        (Some(k), Some(v)) => {
            ws.config_mut().set(k, v)?;
            println!("Set {} = {}", k, v);
        }
        (None, Some(_)) => {
            return Err(Error::Validation("Key required when setting a value".to_string()));
        }
    }

    Ok(())
}
