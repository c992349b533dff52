pub mod handlers;
pub mod password;
pub mod session;

use crate::db::models::Post;
use crate::extractors::CurrentUser;

pub const LOGIN_PATH: &str = "/auth/login/";

/// Login page URL that sends the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

/// Where to go after logging in. Only same-site paths are honoured.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Ownership gate for edits: only the post's author may change it.
pub fn is_author(user: &CurrentUser, post: &Post) -> bool {
    user.id == post.author_id
}
