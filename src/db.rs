use anyhow::Context;
use tracing::info;

use crate::state::AppState;
use crate::users::{dto::UserCreate, repo_types::User, services};
use crate::validation::normalize_email;

/// Apply embedded migrations.
pub async fn migrate(state: &AppState) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Create the configured first superuser unless it already exists.
pub async fn init_db(state: &AppState) -> anyhow::Result<()> {
    let email = normalize_email(&state.config.first_superuser);
    if User::find_by_email(&state.db, &email)
        .await
        .context("look up first superuser")?
        .is_some()
    {
        return Ok(());
    }

    let mut input = UserCreate {
        email,
        password: state.config.first_superuser_password.clone(),
        is_active: true,
        is_superuser: true,
        full_name: None,
    };
    input
        .validate()
        .map_err(|e| anyhow::anyhow!("FIRST_SUPERUSER: {e}"))?;
    let user = services::create_user(&state.db, input)
        .await
        .map_err(|e| anyhow::anyhow!("create first superuser: {e}"))?;
    info!(user_id = %user.id, email = %user.email, "first superuser created");
    Ok(())
}
