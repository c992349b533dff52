//! Account and group management for the command line.
//!
//! Groups have no web form; operators create them with `quill create-group`.

use anyhow::Context;
use slug::slugify;

use crate::auth::password;
use crate::config::AuthConfig;
use crate::db::models::{Group, User};
use crate::posts::repository::BlogRepository;

/// The slug to store for a group: the explicit one if given (it must
/// already be in slug form), otherwise one derived from the title.
pub fn group_slug(title: &str, explicit: Option<&str>) -> anyhow::Result<String> {
    match explicit {
        Some(slug) => {
            let slug = slug.trim();
            if slug.is_empty() || slugify(slug) != slug {
                anyhow::bail!(
                    "`{}` is not a valid slug; use lowercase letters, digits and hyphens",
                    slug
                );
            }
            Ok(slug.to_string())
        }
        None => {
            let derived = slugify(title);
            if derived.is_empty() {
                anyhow::bail!("cannot derive a slug from `{}`; pass --slug", title);
            }
            Ok(derived)
        }
    }
}

pub async fn create_group(
    blog: &dyn BlogRepository,
    title: &str,
    slug: Option<&str>,
    description: &str,
) -> anyhow::Result<Group> {
    let title = title.trim();
    if title.is_empty() {
        anyhow::bail!("group title is required");
    }
    let slug = group_slug(title, slug)?;
    let group = blog
        .create_group(title, &slug, description.trim())
        .await
        .with_context(|| format!("creating group {}", slug))?;
    tracing::info!("Created group {} ({})", group.title, group.slug);
    Ok(group)
}

pub async fn create_user(
    blog: &dyn BlogRepository,
    auth: &AuthConfig,
    username: &str,
    password: &str,
) -> anyhow::Result<User> {
    let username = username.trim();
    password::validate_username(username).map_err(anyhow::Error::msg)?;
    password::validate_password(password, password).map_err(anyhow::Error::msg)?;

    let hash = password::hash_password(password, auth.password_cost)?;
    let user = blog
        .create_user(username, Some(&hash))
        .await
        .with_context(|| format!("creating user {}", username))?;
    tracing::info!("Created user {}", user.username);
    Ok(user)
}
