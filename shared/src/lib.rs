pub mod comments;
pub mod points;
pub mod votes;

pub use comments::{Comment, Reply};
pub use points::{score, Scores};
pub use votes::{VoteDirection, VoteSets};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Users ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KarmaPoints {
    pub post_karma: i64,
    pub comment_karma: i64,
}

impl KarmaPoints {
    pub fn total(&self) -> i64 {
        self.post_karma + self.comment_karma
    }
}

/// The User aggregate as stored. Karma counters may go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub karma_points: KarmaPoints,
    /// IDs of posts this user authored.
    pub posts: Vec<String>,
    /// IDs of subreddits this user is subscribed to.
    pub subscribed_subs: Vec<String>,
    /// Lifetime count of comments and replies written.
    pub total_comments: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            karma_points: KarmaPoints::default(),
            posts: Vec::new(),
            subscribed_subs: Vec::new(),
            total_comments: 0,
            created_at: Utc::now(),
        }
    }
}

// ── Subreddits ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subreddit {
    pub id: String,
    pub subreddit_name: String,
    pub description: String,
    /// User ID of the creator/admin.
    pub admin: String,
    /// IDs of posts submitted to this subreddit.
    pub posts: Vec<String>,
    /// IDs of subscribed users.
    pub subscribed_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Subreddit {
    pub fn new(subreddit_name: String, description: String, admin: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subreddit_name,
            description,
            admin,
            posts: Vec::new(),
            subscribed_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Toggles a user's subscription, returning true when now subscribed.
    pub fn toggle_subscription(&mut self, user_id: &str) -> bool {
        if let Some(pos) = self.subscribed_by.iter().position(|id| id == user_id) {
            self.subscribed_by.remove(pos);
            false
        } else {
            self.subscribed_by.push(user_id.to_string());
            true
        }
    }
}

// ── Posts ──

/// The submission body of a post. Exactly one variant is populated and the
/// tag doubles as the post type on the wire (`postType` plus the matching
/// `*Submission` field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "postType", rename_all_fields = "camelCase")]
pub enum Submission {
    Text { text_submission: String },
    Link { link_submission: String },
    Image { image_submission: String },
}

impl Submission {
    pub fn post_type(&self) -> &'static str {
        match self {
            Submission::Text { .. } => "Text",
            Submission::Link { .. } => "Link",
            Submission::Image { .. } => "Image",
        }
    }
}

/// The Post aggregate. Owns its comment tree; references author and
/// subreddit by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub submission: Submission,
    pub author: String,
    pub subreddit: String,
    #[serde(flatten)]
    pub votes: VoteSets,
    pub points_count: i64,
    pub vote_ratio: f64,
    pub hot_algo: f64,
    pub controversial_algo: f64,
    pub comment_count: i64,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Creates a post with the author already upvoting it. Vote ratio and
    /// controversy stay zero until the first explicit vote recomputes them;
    /// the hot rank starts from the creation timestamp at zero age.
    pub fn new(title: String, submission: Submission, author: &str, subreddit: &str) -> Self {
        let now = Utc::now();
        let mut votes = VoteSets::default();
        votes.toggle(VoteDirection::Up, author);
        let points_count = votes.points_count();
        let hot_algo = points::score(1, 0, now).hot_algo;
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            submission,
            author: author.to_string(),
            subreddit: subreddit.to_string(),
            votes,
            points_count,
            vote_ratio: 0.0,
            hot_algo,
            controversial_algo: 0.0,
            comment_count: 0,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reruns the ranking scorer from the current vote tallies.
    pub fn rescore(&mut self) {
        let (up, down) = self.votes.counts();
        let scores = points::score(up, down, self.created_at);
        self.points_count = scores.points_count;
        self.vote_ratio = scores.vote_ratio;
        self.hot_algo = scores.hot_algo;
        self.controversial_algo = scores.controversial_algo;
    }
}

// ── Wire DTOs ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubredditInfo {
    pub id: String,
    pub subreddit_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub karma_points: KarmaPoints,
    pub total_comments: i64,
    pub post_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Post creation request. Submission fields are optional here so that a
/// type/field mismatch surfaces as a domain validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub title: String,
    pub subreddit: String,
    pub post_type: String,
    pub text_submission: Option<String>,
    pub link_submission: Option<String>,
    pub image_submission: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPost {
    pub text_submission: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReply {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubreddit {
    pub subreddit_name: String,
    pub description: String,
}

/// A post with author and subreddit identity populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub submission: Submission,
    pub author: UserInfo,
    pub subreddit: SubredditInfo,
    pub upvoted_by: Vec<String>,
    pub downvoted_by: Vec<String>,
    pub points_count: i64,
    pub vote_ratio: f64,
    pub comment_count: i64,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub commented_by: UserInfo,
    pub comment_body: String,
    pub upvoted_by: Vec<String>,
    pub downvoted_by: Vec<String>,
    pub points_count: i64,
    pub replies: Vec<ReplyView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: String,
    pub replied_by: UserInfo,
    pub reply_body: String,
    pub upvoted_by: Vec<String>,
    pub downvoted_by: Vec<String>,
    pub points_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubredditView {
    pub id: String,
    pub subreddit_name: String,
    pub description: String,
    pub admin: UserInfo,
    pub subscriber_count: usize,
    pub posts: Vec<PostView>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a subscription toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub subscribed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}
