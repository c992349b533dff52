#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use quill::auth::{password, session};
use quill::config::Config;
use quill::db::models::{Group, Post, User};
use quill::posts::form::PostDraft;
use quill::state::AppState;
use quill::{db, routes};

pub struct TestApp {
    _dir: TempDir,
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_page_size(quill::config::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: u32) -> Self {
        let dir = TempDir::new().unwrap();
        let pool = db::create_pool(&dir.path().join("test.db")).expect("create test database");
        db::run_migrations(&pool).expect("run migrations");

        let mut config = Config::default();
        config.auth.password_cost = 4;
        config.feed.page_size = page_size;

        let state = AppState::new(pool, config);
        let router = routes::app(state.clone());
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        let hash = password::hash_password("correct horse", 4).unwrap();
        self.state
            .blog
            .create_user(username, Some(&hash))
            .await
            .unwrap()
    }

    /// `Cookie` header value for a fresh session of `user`.
    pub fn login(&self, user: &User) -> String {
        let token = session::create_session(&self.state.db, user.id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.state
            .blog
            .create_group(title, slug, "A group for testing")
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> i64 {
        let draft = PostDraft {
            text: text.to_string(),
            group_id: group.map(|g| g.id),
        };
        self.state.blog.create_post(author.id, &draft).await.unwrap()
    }

    pub async fn stored_post(&self, id: i64) -> Post {
        self.state.blog.find_post(id).await.unwrap().unwrap()
    }

    pub async fn post_count(&self) -> u64 {
        self.state
            .blog
            .count_posts(quill::posts::repository::PostFilter::All)
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Number of post cards rendered on a listing page.
pub async fn cards_on_page(response: Response<Body>) -> usize {
    assert_eq!(response.status(), StatusCode::OK);
    body_text(response)
        .await
        .matches("<article class=\"card\">")
        .count()
}

pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// The decoded `next` parameter of a login redirect.
pub fn login_next(location: &str) -> Option<String> {
    let (path, query) = location.split_once('?')?;
    assert_eq!(path, quill::auth::LOGIN_PATH);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "next")
        .map(|(_, v)| v.into_owned())
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}
