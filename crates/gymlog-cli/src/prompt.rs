use std::io::{self, Write};

use anyhow::Result;

/// Environment variable read instead of prompting for the password
const PASSWORD_ENV: &str = "GYMLOG_PASSWORD";

/// Ask for a line of input, offering `default` when one is known
pub fn prompt_line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => print!("{} [{}]: ", label, default),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(default) if input.is_empty() => default.to_string(),
        _ => input.to_string(),
    })
}

pub fn prompt_password(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(format!("{}: ", label))?)
}

/// Sign-in password: `GYMLOG_PASSWORD` if set, otherwise prompt
pub fn login_password() -> Result<String> {
    match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => prompt_password("Password"),
    }
}
