mod common;

use std::thread;
use std::time::Duration;

use crabbit_api::votes::vote_post;
use crabbit_api::{db, DbPool};
use crabbit_shared::VoteDirection;

use common::*;

struct TempDb {
    path: std::path::PathBuf,
    pool: DbPool,
}

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("crabbit-test-{}.db", uuid::Uuid::new_v4()));
        let manager = r2d2_sqlite::SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
            Ok(())
        });
        let pool = r2d2::Pool::builder().max_size(4).build(manager).expect("pool");
        db::run_migrations(&pool).expect("migrations");
        Self { path, pool }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut p = self.path.as_os_str().to_owned();
            p.push(suffix);
            let _ = std::fs::remove_file(p);
        }
    }
}

// Read-modify-write cycles on the same post from parallel connections must
// serialize; neither vote may clobber the other.
#[test]
fn concurrent_votes_on_one_post_all_land() {
    let db = TempDb::new();
    let (author, post) = {
        let mut conn = db.pool.get().unwrap();
        let author = seed_user(&conn, "author");
        let sub = seed_subreddit(&conn, "rustaceans", &author);
        let post = seed_post(&mut conn, &author, &sub);
        (author, post)
    };

    let mut handles = Vec::new();
    for i in 0..4 {
        let pool = db.pool.clone();
        let post_id = post.id.clone();
        handles.push(thread::spawn(move || {
            let voter = {
                let conn = pool.get().unwrap();
                seed_user(&conn, &format!("voter{i}"))
            };
            let mut conn = pool.get().unwrap();
            vote_post(&mut conn, &post_id, &voter.id, VoteDirection::Up).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let conn = db.pool.get().unwrap();
    let post = reload_post(&conn, &post.id);
    assert_eq!(post.votes.counts(), (5, 0));
    assert_eq!(post.points_count, 5);
    // Each vote's karma credit survived too.
    let author = reload_user(&conn, &author.id);
    assert_eq!(author.karma_points.post_karma, 5);
}

#[test]
fn opposing_concurrent_votes_balance_out() {
    let db = TempDb::new();
    let (author, post) = {
        let mut conn = db.pool.get().unwrap();
        let author = seed_user(&conn, "author");
        let sub = seed_subreddit(&conn, "rustaceans", &author);
        let post = seed_post(&mut conn, &author, &sub);
        (author, post)
    };

    let mut handles = Vec::new();
    for i in 0..4 {
        let pool = db.pool.clone();
        let post_id = post.id.clone();
        let direction = if i % 2 == 0 {
            VoteDirection::Up
        } else {
            VoteDirection::Down
        };
        handles.push(thread::spawn(move || {
            let voter = {
                let conn = pool.get().unwrap();
                seed_user(&conn, &format!("voter{i}"))
            };
            let mut conn = pool.get().unwrap();
            vote_post(&mut conn, &post_id, &voter.id, direction).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let conn = db.pool.get().unwrap();
    let post = reload_post(&conn, &post.id);
    assert_eq!(post.votes.counts(), (3, 2));
    assert_eq!(post.points_count, 1);
    assert_eq!(reload_user(&conn, &author.id).karma_points.post_karma, 1);
}
