use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::i18n::Lang;
use crate::state::AppState;
use crate::users::repo::CreateUserError;
use crate::users::repo_types::{NewUser, Role, User};

/// Creates the initial ADMIN account from `ADMIN_*` environment variables
/// when it does not exist yet. With no seed variables set this is a no-op;
/// a partial set logs a warning and skips, so a missing variable never
/// keeps the service from starting.
pub async fn run_admin_seed(state: &AppState) -> anyhow::Result<()> {
    let email = std::env::var("ADMIN_EMAIL").ok();
    let password = std::env::var("ADMIN_PASSWORD").ok();
    let name = std::env::var("ADMIN_NAME").ok();
    let document = std::env::var("ADMIN_DOCUMENT").ok();

    let any_set = email.is_some() || password.is_some() || name.is_some() || document.is_some();
    let (Some(email), Some(password), Some(name), Some(document)) =
        (email, password, name, document)
    else {
        if any_set {
            warn!(
                "incomplete admin seed configuration \
                 (ADMIN_EMAIL, ADMIN_PASSWORD, ADMIN_NAME and ADMIN_DOCUMENT are all required); skipping"
            );
        }
        return Ok(());
    };

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Ok(());
    }

    let candidate = NewUser {
        name,
        lastname: std::env::var("ADMIN_LASTNAME").unwrap_or_default(),
        email,
        password_hash: hash_password(&password)?,
        document,
        phone: std::env::var("ADMIN_PHONE").unwrap_or_default(),
        lang: std::env::var("ADMIN_LANG").ok().and_then(|v| Lang::parse(&v)),
        role: Role::Admin,
    };

    match User::create(&state.db, &candidate).await {
        Ok(admin) => {
            info!(user_id = %admin.id, "seeded initial admin user");
            Ok(())
        }
        // Another instance seeded it between the lookup and the insert
        Err(CreateUserError::Conflict) => Ok(()),
        Err(CreateUserError::Db(e)) => Err(e.into()),
    }
}
