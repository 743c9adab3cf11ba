//! One function per subcommand. Each receives the session explicitly.

use anyhow::{anyhow, bail, Result};
use futures::future::join_all;
use tracing::warn;

use gymlog_core::models::{Exercise, ProfileUpdate, SignUpRequest};
use gymlog_core::utils::{capitalize, truncate_string};
use gymlog_core::{user_message, Config, SessionManager};

use crate::prompt::{login_password, prompt_line, prompt_password};

/// Width of the exercise name column in listings
const NAME_COLUMN_WIDTH: usize = 28;

/// Turn a failure into the message the user should see: the server's own
/// message when it sent one, otherwise `fallback`.
fn present(err: anyhow::Error, fallback: &str) -> anyhow::Error {
    warn!("Command failed: {:#}", err);
    anyhow!(user_message(&err, fallback))
}

async fn require_session(session: &SessionManager) -> Result<()> {
    if !session.is_authenticated().await {
        bail!("You are not signed in. Run `gymlog sign-in` first.");
    }
    Ok(())
}

// ===== Account =====

pub async fn sign_in(
    session: &SessionManager,
    config: &mut Config,
    email: Option<String>,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_line("Email", config.last_email.as_deref())?,
    };
    let password = login_password()?;

    let user = session
        .sign_in(&email, &password)
        .await
        .map_err(|e| present(e, "Could not sign in. Try again later."))?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Welcome, {}!", user.first_name());
    Ok(())
}

pub async fn sign_up(
    session: &SessionManager,
    config: &mut Config,
    name: String,
    email: String,
) -> Result<()> {
    let password = prompt_password("Password")?;
    let confirm = prompt_password("Confirm password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let request = SignUpRequest {
        name,
        email: email.clone(),
        password,
    };
    let user = session
        .sign_up(&request)
        .await
        .map_err(|e| present(e, "Could not create the account. Try again later."))?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Account created. Welcome, {}!", user.first_name());
    Ok(())
}

pub async fn sign_out(session: &SessionManager) -> Result<()> {
    session
        .sign_out()
        .await
        .map_err(|e| present(e, "Signed out, but the stored session could not be removed."))?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(session: &SessionManager) -> Result<()> {
    let snapshot = session.snapshot().await;
    match snapshot.user {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            if let Some(url) = session.client().await.avatar_url(&user) {
                println!("Avatar: {}", url);
            }
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

pub async fn profile(
    session: &SessionManager,
    name: Option<String>,
    change_password: bool,
) -> Result<()> {
    require_session(session).await?;
    let current = session
        .user()
        .await
        .ok_or_else(|| anyhow!("You are not signed in."))?;

    let name = match name {
        Some(name) => name,
        None => prompt_line("Name", Some(&current.name))?,
    };
    if name.trim().is_empty() {
        bail!("Name is required");
    }

    let mut update = ProfileUpdate::rename(name.trim());
    if change_password {
        let old_password = prompt_password("Current password")?;
        let new_password = prompt_password("New password")?;
        let confirm = prompt_password("Confirm new password")?;
        if new_password != confirm {
            bail!("Passwords do not match");
        }
        update = update.with_password_change(old_password, new_password);
    }

    let user = session
        .update_profile(&update)
        .await
        .map_err(|e| present(e, "Could not update the profile. Try again later."))?;

    println!("Profile updated: {}", user.name);
    Ok(())
}

// ===== Exercises =====

pub async fn groups(session: &SessionManager) -> Result<()> {
    require_session(session).await?;
    let groups = session
        .client()
        .await
        .fetch_groups()
        .await
        .map_err(|e| present(e, "Could not load the muscle groups."))?;

    for group in groups {
        println!("{}", capitalize(&group));
    }
    Ok(())
}

fn print_exercises(exercises: &[Exercise]) {
    for exercise in exercises {
        println!(
            "  {:>4}  {:<width$}  {}",
            exercise.id,
            truncate_string(&exercise.name, NAME_COLUMN_WIDTH),
            exercise.sets_display(),
            width = NAME_COLUMN_WIDTH
        );
    }
}

pub async fn exercises(session: &SessionManager, group: Option<String>) -> Result<()> {
    require_session(session).await?;
    let client = session.client().await;

    let groups = match group {
        Some(group) => vec![group],
        None => client
            .fetch_groups()
            .await
            .map_err(|e| present(e, "Could not load the muscle groups."))?,
    };

    let results = join_all(groups.iter().map(|g| client.fetch_exercises_by_group(g))).await;

    for (group, result) in groups.iter().zip(results) {
        let exercises = result.map_err(|e| present(e, "Could not load the exercises."))?;
        println!("{} ({})", capitalize(group), exercises.len());
        print_exercises(&exercises);
    }
    Ok(())
}

pub async fn exercise(session: &SessionManager, id: i64) -> Result<()> {
    require_session(session).await?;
    let client = session.client().await;
    let exercise = client
        .fetch_exercise(id)
        .await
        .map_err(|e| present(e, "Could not load the exercise details."))?;

    println!("{}", exercise.name);
    println!("Group: {}", capitalize(&exercise.group));
    println!("{}", exercise.sets_display());
    if !exercise.demo.is_empty() {
        println!("Demo: {}", client.exercise_demo_url(&exercise));
    }
    Ok(())
}

pub async fn done(session: &SessionManager, id: i64) -> Result<()> {
    require_session(session).await?;
    session
        .client()
        .await
        .register_exercise(id)
        .await
        .map_err(|e| present(e, "Could not log the exercise."))?;

    println!("Nice work! Exercise logged to your history.");
    Ok(())
}

pub async fn history(session: &SessionManager) -> Result<()> {
    require_session(session).await?;
    let days = session
        .client()
        .await
        .fetch_history()
        .await
        .map_err(|e| present(e, "Could not load the history."))?;

    if days.is_empty() {
        println!("No exercises logged yet.");
        return Ok(());
    }

    for day in days {
        println!("{}", day.title);
        for entry in &day.data {
            println!(
                "  {}  {:<width$}  {}",
                entry.hour,
                truncate_string(&entry.name, NAME_COLUMN_WIDTH),
                capitalize(&entry.group),
                width = NAME_COLUMN_WIDTH
            );
        }
    }
    Ok(())
}
