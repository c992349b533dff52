use askama::Template;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::auth;
use crate::db::models::{Group, GroupRef, Post, User};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::humanize;
use crate::pagination::{Page, PageQuery, PageRequest};
use crate::posts::form::{EditDecision, PostForm, PostFormView};
use crate::posts::repository::PostFilter;
use crate::routes::Html;
use crate::state::AppState;

// --- View structs ---

pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub group: Option<GroupRef>,
    pub created: String,
}

impl From<Post> for PostCard {
    fn from(post: Post) -> Self {
        Self {
            created: humanize::relative_time(&post.created_at),
            id: post.id,
            text: post.text,
            author: post.author_username,
            group: post.group,
        }
    }
}

// --- Templates ---

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub viewer: Option<String>,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub viewer: Option<String>,
    pub group: Group,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<String>,
    pub author: User,
    pub joined: String,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<String>,
    pub post: PostCard,
    pub posted_at: String,
    pub author_post_count: u64,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub viewer: Option<String>,
    pub form: PostFormView,
    pub is_edit: bool,
    pub action: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/create/", get(create_post_page).post(create_post))
        .route("/posts/{post_id}/edit/", get(edit_post_page).post(edit_post))
}

pub fn profile_path(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_path(id: i64) -> String {
    format!("/posts/{}/", id)
}

fn edit_path(id: i64) -> String {
    format!("/posts/{}/edit/", id)
}

// --- Read handlers ---

async fn index(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<IndexTemplate>> {
    let page = state
        .blog
        .list_posts(PostFilter::All, state.paginator(), PageRequest::from(&query))
        .await?;

    Ok(Html(IndexTemplate {
        viewer: maybe_user.username(),
        page: page.map(PostCard::from),
    }))
}

async fn group_posts(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<GroupListTemplate>> {
    let group = state
        .blog
        .find_group_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = state
        .blog
        .list_posts(
            PostFilter::Group(group.id),
            state.paginator(),
            PageRequest::from(&query),
        )
        .await?;

    Ok(Html(GroupListTemplate {
        viewer: maybe_user.username(),
        group,
        page: page.map(PostCard::from),
    }))
}

async fn profile(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<ProfileTemplate>> {
    let author = state
        .blog
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = state
        .blog
        .list_posts(
            PostFilter::Author(author.id),
            state.paginator(),
            PageRequest::from(&query),
        )
        .await?;

    Ok(Html(ProfileTemplate {
        viewer: maybe_user.username(),
        joined: humanize::full_date(&author.created_at),
        author,
        page: page.map(PostCard::from),
    }))
}

async fn post_detail(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<PostDetailTemplate>> {
    let post = load_post(&state, &post_id).await?;
    let author_post_count = state
        .blog
        .count_posts(PostFilter::Author(post.author_id))
        .await?;
    let can_edit = maybe_user
        .0
        .as_ref()
        .is_some_and(|user| auth::is_author(user, &post));

    Ok(Html(PostDetailTemplate {
        viewer: maybe_user.username(),
        posted_at: humanize::full_date(&post.created_at),
        author_post_count,
        can_edit,
        post: PostCard::from(post),
    }))
}

// --- Write handlers ---

async fn create_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PostFormTemplate>> {
    let groups = state.blog.list_groups().await?;
    Ok(Html(PostFormTemplate {
        viewer: Some(user.username),
        form: PostFormView::new(&PostForm::default(), &groups, None),
        is_edit: false,
        action: "/create/".to_string(),
    }))
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    form: Result<Form<PostForm>, FormRejection>,
) -> AppResult<Response> {
    let form = bind_form(&headers, form)?;
    let groups = state.blog.list_groups().await?;

    match form.validate(&groups) {
        Ok(draft) => {
            let post_id = state.blog.create_post(user.id, &draft).await?;
            tracing::info!("Post {} created by {}", post_id, user.username);
            Ok(Redirect::to(&profile_path(&user.username)).into_response())
        }
        Err(errors) => Ok(Html(PostFormTemplate {
            viewer: Some(user.username),
            form: PostFormView::new(&form, &groups, Some(&errors)),
            is_edit: false,
            action: "/create/".to_string(),
        })
        .into_response()),
    }
}

async fn edit_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<PostFormTemplate>> {
    let post = load_post(&state, &post_id).await?;
    let groups = state.blog.list_groups().await?;

    Ok(Html(PostFormTemplate {
        viewer: Some(user.username),
        form: PostFormView::new(&PostForm::from_post(&post), &groups, None),
        is_edit: true,
        action: edit_path(post.id),
    }))
}

async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    form: Result<Form<PostForm>, FormRejection>,
) -> AppResult<Response> {
    let post = load_post(&state, &post_id).await?;
    let form = bind_form(&headers, form)?;
    let groups = state.blog.list_groups().await?;

    let view = match EditDecision::decide(auth::is_author(&user, &post), &form, &groups) {
        EditDecision::Save(draft) => {
            state.blog.update_post(post.id, &draft).await?;
            tracing::info!("Post {} edited by {}", post.id, user.username);
            return Ok(Redirect::to(&post_path(post.id)).into_response());
        }
        EditDecision::RedisplayWithErrors(errors) => {
            PostFormView::new(&form, &groups, Some(&errors))
        }
        EditDecision::Redisplay => {
            tracing::warn!(
                "User {} is not the author of post {}; edit ignored",
                user.username,
                post.id
            );
            PostFormView::new(&form, &groups, None)
        }
    };

    Ok(Html(PostFormTemplate {
        viewer: Some(user.username),
        form: view,
        is_edit: true,
        action: edit_path(post.id),
    })
    .into_response())
}

// --- Helpers ---

/// A submission without any body counts as an empty form; a body in some
/// other encoding is rejected.
fn bind_form(
    headers: &HeaderMap,
    form: Result<Form<PostForm>, FormRejection>,
) -> AppResult<PostForm> {
    match form {
        Ok(Form(form)) => Ok(form),
        Err(FormRejection::InvalidFormContentType(_))
            if !headers.contains_key(header::CONTENT_TYPE) =>
        {
            Ok(PostForm::default())
        }
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

/// Post ids in paths are positive integers; anything else is simply not found.
async fn load_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    if raw_id.is_empty() || !raw_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound);
    }
    let id = raw_id
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(AppError::NotFound)?;
    state.blog.find_post(id).await?.ok_or(AppError::NotFound)
}
