use chrono::{DateTime, Utc};

/// Derived ranking values for one entity's vote tallies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub points_count: i64,
    /// Percentage of upvotes among all votes, 0 when unvoted.
    pub vote_ratio: f64,
    /// Sortable "hot" rank: log-magnitude of the net points plus the
    /// creation time in epoch milliseconds. Higher is hotter.
    pub hot_algo: f64,
    /// Rewards large, near-even up/down splits; 0 when either side is 0.
    pub controversial_algo: f64,
}

/// Recomputes every ranking value from the raw tallies and creation time.
/// Pure; called on every vote and once at post creation.
pub fn score(upvotes: usize, downvotes: usize, created_at: DateTime<Utc>) -> Scores {
    let points_count = upvotes as i64 - downvotes as i64;
    let total = upvotes + downvotes;

    let vote_ratio = if total == 0 {
        0.0
    } else {
        (upvotes as f64 / total as f64 * 100.0).round()
    };

    // At one net point the magnitude term vanishes and the rank is exactly
    // the creation timestamp; each order of magnitude of points is worth
    // 10000 ms of recency.
    let magnitude = (points_count.unsigned_abs().max(1) as f64).log10();
    let sign = (points_count.signum()) as f64;
    let hot_algo = 10_000.0 * sign * magnitude + created_at.timestamp_millis() as f64;

    let controversial_algo = if upvotes == 0 || downvotes == 0 {
        0.0
    } else {
        let balance = upvotes.min(downvotes) as f64 / upvotes.max(downvotes) as f64;
        (total as f64).powf(balance)
    };

    Scores {
        points_count,
        vote_ratio,
        hot_algo,
        controversial_algo,
    }
}
