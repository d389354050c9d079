use serde_json::Value;

use crate::auth::hash_password;
use crate::config::BootstrapConfig;
use crate::database::{Document, DocumentStore};
use crate::filter::Filter;
use crate::services::records::RecordError;
use crate::types::{EntityType, Role};

/// Create the configured SuperAdmin if no user holds that email yet.
/// Returns whether an account was created.
pub async fn ensure_super_admin(
    store: &dyn DocumentStore,
    bootstrap: &BootstrapConfig,
) -> Result<bool, RecordError> {
    let (Some(email), Some(password)) = (&bootstrap.admin_email, &bootstrap.admin_password) else {
        return Ok(false);
    };
    let email = email.trim().to_lowercase();

    let existing = store
        .find(EntityType::User, &Filter::new().eq("email", email.clone()))
        .await?;
    if !existing.is_empty() {
        tracing::debug!("Bootstrap admin {} already exists", email);
        return Ok(false);
    }

    let mut user = Document::new();
    user.insert("name".to_string(), Value::String("Super Admin".to_string()));
    user.insert("email".to_string(), Value::String(email.clone()));
    user.insert("password".to_string(), Value::String(hash_password(password)?));
    user.insert("role".to_string(), Value::String(Role::SuperAdmin.as_str().to_string()));

    store.insert(EntityType::User, user).await?;
    tracing::info!("Created bootstrap SuperAdmin {}", email);
    Ok(true)
}
