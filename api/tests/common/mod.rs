#![allow(dead_code)]

use rusqlite::Connection;

use crabbit_api::{db, posts, store, DbPool};
use crabbit_shared::{CreatePost, Post, Subreddit, User};

/// One-connection in-memory pool; every :memory: connection is its own
/// database, so the pool must never hand out a second one.
pub fn memory_pool() -> DbPool {
    let manager = r2d2_sqlite::SqliteConnectionManager::memory();
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("pool");
    db::run_migrations(&pool).expect("migrations");
    pool
}

pub fn seed_user(conn: &Connection, name: &str) -> User {
    let user = User::new(name.to_string(), "not-a-real-hash".to_string());
    store::insert_user(conn, &user).expect("insert user");
    user
}

pub fn seed_subreddit(conn: &Connection, name: &str, admin: &User) -> Subreddit {
    let sub = Subreddit::new(
        name.to_string(),
        "a test community".to_string(),
        admin.id.clone(),
    );
    store::insert_subreddit(conn, &sub).expect("insert subreddit");
    sub
}

pub fn text_post_payload(sub_id: &str, title: &str) -> CreatePost {
    CreatePost {
        title: title.to_string(),
        subreddit: sub_id.to_string(),
        post_type: "Text".to_string(),
        text_submission: Some("hello world".to_string()),
        link_submission: None,
        image_submission: None,
    }
}

pub fn seed_post(conn: &mut Connection, author: &User, sub: &Subreddit) -> Post {
    posts::create_post(conn, &author.id, text_post_payload(&sub.id, "A test post"))
        .expect("create post")
}

pub fn reload_user(conn: &Connection, id: &str) -> User {
    store::find_user(conn, id).expect("query").expect("user exists")
}

pub fn reload_post(conn: &Connection, id: &str) -> Post {
    store::find_post(conn, id).expect("query").expect("post exists")
}
