use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use crabbit_shared::{Post, Subreddit, SubredditInfo, User};

use crate::error::ApiError;
use crate::DbPool;

/// Runs blocking storage work on the blocking pool with a pooled
/// connection, the way every handler talks to sqlite.
pub async fn with_conn<T, F>(pool: DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await
    .map_err(ApiError::internal)?
}

/// Every mutation that touches more than one aggregate runs inside one
/// IMMEDIATE transaction: the write lock is taken up front, so concurrent
/// read-modify-write cycles serialize instead of losing updates, and the
/// post save and karma save commit together.
pub fn begin(conn: &mut Connection) -> Result<Transaction<'_>, ApiError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

// ── Users ──

pub fn find_user(conn: &Connection, id: &str) -> Result<Option<User>, ApiError> {
    let doc: Option<String> = conn
        .query_row("SELECT doc FROM users WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).map_err(ApiError::from))
        .transpose()
}

/// Username lookups are case-insensitive.
pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, ApiError> {
    let doc: Option<String> = conn
        .query_row(
            "SELECT doc FROM users WHERE username_lower = ?1",
            [username.to_lowercase()],
            |row| row.get(0),
        )
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).map_err(ApiError::from))
        .transpose()
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), ApiError> {
    let doc = serde_json::to_string(user)?;
    let result = conn.execute(
        "INSERT INTO users (id, username_lower, doc) VALUES (?1, ?2, ?3)",
        params![user.id, user.username.to_lowercase(), doc],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(ApiError::Conflict(format!(
                "Username '{}' is already taken.",
                user.username
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn save_user(conn: &Connection, user: &User) -> Result<(), ApiError> {
    let doc = serde_json::to_string(user)?;
    conn.execute(
        "UPDATE users SET doc = ?2 WHERE id = ?1",
        params![user.id, doc],
    )?;
    Ok(())
}

/// Resolves usernames for a set of user IDs in one pass over the docs.
pub fn usernames(conn: &Connection, ids: &HashSet<&str>) -> Result<HashMap<String, String>, ApiError> {
    let mut map = HashMap::with_capacity(ids.len());
    for id in ids {
        if let Some(user) = find_user(conn, id)? {
            map.insert(user.id, user.username);
        }
    }
    Ok(map)
}

// ── Subreddits ──

pub fn find_subreddit(conn: &Connection, id: &str) -> Result<Option<Subreddit>, ApiError> {
    let doc: Option<String> = conn
        .query_row("SELECT doc FROM subreddits WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).map_err(ApiError::from))
        .transpose()
}

pub fn find_subreddit_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Subreddit>, ApiError> {
    let doc: Option<String> = conn
        .query_row(
            "SELECT doc FROM subreddits WHERE name_lower = ?1",
            [name.to_lowercase()],
            |row| row.get(0),
        )
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).map_err(ApiError::from))
        .transpose()
}

pub fn insert_subreddit(conn: &Connection, sub: &Subreddit) -> Result<(), ApiError> {
    let doc = serde_json::to_string(sub)?;
    let result = conn.execute(
        "INSERT INTO subreddits (id, name_lower, doc) VALUES (?1, ?2, ?3)",
        params![sub.id, sub.subreddit_name.to_lowercase(), doc],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(ApiError::Conflict(format!(
                "Subreddit with name '{}' already exists.",
                sub.subreddit_name
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn save_subreddit(conn: &Connection, sub: &Subreddit) -> Result<(), ApiError> {
    let doc = serde_json::to_string(sub)?;
    conn.execute(
        "UPDATE subreddits SET doc = ?2 WHERE id = ?1",
        params![sub.id, doc],
    )?;
    Ok(())
}

pub fn list_subreddits(conn: &Connection) -> Result<Vec<SubredditInfo>, ApiError> {
    let mut stmt = conn.prepare("SELECT doc FROM subreddits ORDER BY name_lower")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut subs = Vec::new();
    for doc in rows {
        let sub: Subreddit = serde_json::from_str(&doc?)?;
        subs.push(SubredditInfo {
            id: sub.id,
            subreddit_name: sub.subreddit_name,
        });
    }
    Ok(subs)
}

// ── Posts ──

pub fn find_post(conn: &Connection, id: &str) -> Result<Option<Post>, ApiError> {
    let doc: Option<String> = conn
        .query_row("SELECT doc FROM posts WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).map_err(ApiError::from))
        .transpose()
}

/// Upserts the post document and refreshes its materialized sort keys.
/// One save per mutation of the aggregate, comments included.
pub fn save_post(conn: &Connection, post: &Post) -> Result<(), ApiError> {
    let doc = serde_json::to_string(post)?;
    conn.execute(
        "INSERT INTO posts (id, doc, created_at, points, vote_ratio, hot, controversial)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             doc = excluded.doc,
             points = excluded.points,
             vote_ratio = excluded.vote_ratio,
             hot = excluded.hot,
             controversial = excluded.controversial",
        params![
            post.id,
            doc,
            post.created_at.timestamp_millis(),
            post.points_count,
            post.vote_ratio,
            post.hot_algo,
            post.controversial_algo,
        ],
    )?;
    Ok(())
}

pub fn delete_post(conn: &Connection, id: &str) -> Result<(), ApiError> {
    conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    Ok(())
}

pub fn count_posts(conn: &Connection) -> Result<i64, ApiError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?)
}

/// Listing order per sort key. Unknown keys fall back to hot, matching the
/// original system's lenient behavior.
fn order_clause(sortby: &str) -> &'static str {
    match sortby {
        "new" => "created_at DESC",
        "old" => "created_at ASC",
        "top" => "points DESC",
        "best" => "vote_ratio DESC",
        "controversial" => "controversial DESC",
        _ => "hot DESC",
    }
}

pub fn list_posts(
    conn: &Connection,
    sortby: &str,
    page: i64,
    limit: i64,
) -> Result<(Vec<Post>, i64), ApiError> {
    let total = count_posts(conn)?;
    let offset = (page - 1) * limit;
    // Ties broken by insertion order via rowid, so listings are deterministic.
    let sql = format!(
        "SELECT doc FROM posts ORDER BY {}, rowid ASC LIMIT ?1 OFFSET ?2",
        order_clause(sortby)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit, offset], |row| row.get::<_, String>(0))?;
    let mut posts = Vec::new();
    for doc in rows {
        posts.push(serde_json::from_str(&doc?)?);
    }
    Ok((posts, total))
}
