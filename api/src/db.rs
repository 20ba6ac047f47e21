use crate::DbPool;

/// Creates the document tables. Each aggregate (user, subreddit, post) is
/// one JSON row; posts additionally materialize their sort keys into
/// columns so listings can ORDER BY without parsing documents.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id             TEXT PRIMARY KEY,
            username_lower TEXT UNIQUE NOT NULL,
            doc            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subreddits (
            id         TEXT PRIMARY KEY,
            name_lower TEXT UNIQUE NOT NULL,
            doc        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            id            TEXT PRIMARY KEY,
            doc           TEXT NOT NULL,
            created_at    INTEGER NOT NULL,
            points        INTEGER NOT NULL,
            vote_ratio    REAL NOT NULL,
            hot           REAL NOT NULL,
            controversial REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);
        CREATE INDEX IF NOT EXISTS idx_posts_hot ON posts(hot);
        CREATE INDEX IF NOT EXISTS idx_posts_points ON posts(points);
        ",
    )?;

    Ok(())
}
