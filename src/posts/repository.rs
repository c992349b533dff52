// Repository pattern - every query the blog pages and forms need
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use thiserror::Error;

use crate::db::models::{Group, GroupRef, Post, User, UserCredentials};
use crate::pagination::{Page, PageRequest, Paginator};
use crate::posts::form::PostDraft;
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
}

impl PostFilter {
    fn condition(&self) -> (&'static str, Option<i64>) {
        match self {
            PostFilter::All => ("1 = 1", None),
            PostFilter::Group(id) => ("p.group_id = ?", Some(*id)),
            PostFilter::Author(id) => ("p.author_id = ?", Some(*id)),
        }
    }
}

/// Repository trait - all blog database operations.
///
/// Lookups signal absence with `Ok(None)`; listings are newest first.
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// One page of posts matching `filter`, ordered by creation time descending.
    async fn list_posts(
        &self,
        filter: PostFilter,
        paginator: Paginator,
        request: PageRequest,
    ) -> Result<Page<Post>, RepositoryError>;

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepositoryError>;

    async fn find_post(&self, id: i64) -> Result<Option<Post>, RepositoryError>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepositoryError>;

    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<User>, RepositoryError>;

    async fn find_user_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError>;

    /// All groups, ordered by title, for the form's choice list.
    async fn list_groups(&self) -> Result<Vec<Group>, RepositoryError>;

    /// Persist a new post by `author_id`; returns the new post id.
    async fn create_post(&self, author_id: i64, draft: &PostDraft) -> Result<i64, RepositoryError>;

    /// Replace a post's text and group. The author and timestamp never change.
    async fn update_post(&self, id: i64, draft: &PostDraft) -> Result<(), RepositoryError>;

    async fn create_user(
        &self,
        username: &str,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError>;

    async fn create_group(
        &self,
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<Group, RepositoryError>;
}

/// SQLite implementation
pub struct SqliteBlogRepository {
    pool: DbPool,
}

impl SqliteBlogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "p.id, p.text, p.author_id, u.username, g.id, g.title, g.slug, p.created_at
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN groups g ON g.id = p.group_id";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    let group_id: Option<i64> = row.get(4)?;
    let group = match group_id {
        Some(id) => Some(GroupRef {
            id,
            title: row.get(5)?,
            slug: row.get(6)?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        group,
        created_at: row.get(7)?,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn count_matching(
    conn: &rusqlite::Connection,
    filter: PostFilter,
) -> Result<u64, RepositoryError> {
    let (condition, value) = filter.condition();
    let sql = format!("SELECT COUNT(*) FROM posts p WHERE {condition}");
    let count: i64 = conn.query_row(&sql, params_from_iter(value.iter()), |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

#[async_trait]
impl BlogRepository for SqliteBlogRepository {
    async fn list_posts(
        &self,
        filter: PostFilter,
        paginator: Paginator,
        request: PageRequest,
    ) -> Result<Page<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let total = count_matching(&conn, filter)?;
        let window = paginator.window(total, request);

        let (condition, value) = filter.condition();
        let sql = format!(
            "SELECT {POST_COLUMNS}
             WHERE {condition}
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ? OFFSET ?"
        );
        let bind: Vec<i64> = value
            .into_iter()
            .chain([i64::from(window.limit), window.offset as i64])
            .collect();

        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(params_from_iter(bind.iter()), post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(posts, window))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepositoryError> {
        let conn = self.pool.get()?;
        count_matching(&conn, filter)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} WHERE p.id = ?1"),
                params![id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepositoryError> {
        let conn = self.pool.get()?;
        let group = conn
            .query_row(
                "SELECT id, title, slug, description FROM groups WHERE slug = ?1",
                params![slug],
                group_from_row,
            )
            .optional()?;
        Ok(group)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_user_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let conn = self.pool.get()?;
        let credentials = conn
            .query_row(
                "SELECT id, username, created_at, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(UserCredentials {
                        user: user_from_row(row)?,
                        password_hash: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT id, title, slug, description FROM groups ORDER BY title, id")?;
        let groups = stmt
            .query_map([], group_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    async fn create_post(&self, author_id: i64, draft: &PostDraft) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (text, author_id, group_id) VALUES (?1, ?2, ?3)",
            params![draft.text, author_id, draft.group_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn update_post(&self, id: i64, draft: &PostDraft) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE posts SET text = ?1, group_id = ?2 WHERE id = ?3",
            params![draft.text, draft.group_id, id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("post {id}")));
        }
        Ok(())
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, password_hash],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("username {username} is taken"))
            } else {
                e.into()
            }
        })?;

        let user = conn.query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            params![conn.last_insert_rowid()],
            user_from_row,
        )?;
        Ok(user)
    }

    async fn create_group(
        &self,
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<Group, RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO groups (title, slug, description) VALUES (?1, ?2, ?3)",
            params![title, slug, description],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("group slug {slug} is taken"))
            } else {
                e.into()
            }
        })?;

        Ok(Group {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        })
    }
}
