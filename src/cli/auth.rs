use crate::backend::AuthProvider;
use crate::error::{Error, Result};
use crate::workspace::Workspace;
use std::io::{self, Write};

/// Run the signup command
pub fn run_signup(email: &str, name: Option<&str>, password: Option<String>) -> Result<()> {
    let ws = Workspace::open()?;
    let mut auth = ws.auth()?;

    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };
    let user = auth.sign_up(email, name.unwrap_or(""), &password)?;

    println!("Signed up and logged in as {}", user.email);
    Ok(())
}

/// Run the login command
pub fn run_login(email: &str, password: Option<String>) -> Result<()> {
    let ws = Workspace::open()?;
    let mut auth = ws.auth()?;

    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };
    let user = auth.sign_in(email, &password)?;

    if user.name.is_empty() {
        println!("Logged in as {}", user.email);
    } else {
        println!("Logged in as {} <{}>", user.name, user.email);
    }
    Ok(())
}

/// Run the logout command
pub fn run_logout() -> Result<()> {
    let ws = Workspace::open()?;
    let mut auth = ws.auth()?;

    if auth.current_user().is_none() {
        println!("Not logged in.");
        return Ok(());
    }

    auth.sign_out()?;
    println!("Logged out.");
    Ok(())
}

/// Run the whoami command
pub fn run_whoami() -> Result<()> {
    let ws = Workspace::open()?;
    let auth = ws.auth()?;

    match auth.current_user() {
        Some(user) => {
            println!("{}", user.email);
            if !user.name.is_empty() {
                println!("  name: {}", user.name);
            }
            println!("  id:   {}", user.id);
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

/// Run the rename command
pub fn run_rename(name: &str) -> Result<()> {
    let ws = Workspace::open()?;
    let mut auth = ws.auth()?;

    let user = auth.update_user(name)?;
    println!("Display name set to {}", user.name);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let value = input.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        return Err(Error::Validation("password cannot be empty".to_string()));
    }
    Ok(value)
}
