use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::votes::{VoteDirection, VoteSets};
use crate::Post;

/// A comment embedded in a post. Owns its replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub commented_by: String,
    pub comment_body: String,
    #[serde(flatten)]
    pub votes: VoteSets,
    pub points_count: i64,
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reply embedded in a comment. Replies do not nest further.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub replied_by: String,
    pub reply_body: String,
    #[serde(flatten)]
    pub votes: VoteSets,
    pub points_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// New comments start with the author self-upvoted, same as posts.
    pub fn new(author: &str, body: String) -> Self {
        let now = Utc::now();
        let mut votes = VoteSets::default();
        votes.toggle(VoteDirection::Up, author);
        let points_count = votes.points_count();
        Self {
            id: Uuid::new_v4().to_string(),
            commented_by: author.to_string(),
            comment_body: body,
            votes,
            points_count,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reply(&self, reply_id: &str) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == reply_id)
    }

    pub fn reply_mut(&mut self, reply_id: &str) -> Option<&mut Reply> {
        self.replies.iter_mut().find(|r| r.id == reply_id)
    }

    pub fn remove_reply(&mut self, reply_id: &str) -> Option<Reply> {
        let pos = self.replies.iter().position(|r| r.id == reply_id)?;
        Some(self.replies.remove(pos))
    }
}

impl Reply {
    pub fn new(author: &str, body: String) -> Self {
        let now = Utc::now();
        let mut votes = VoteSets::default();
        votes.toggle(VoteDirection::Up, author);
        let points_count = votes.points_count();
        Self {
            id: Uuid::new_v4().to_string(),
            replied_by: author.to_string(),
            reply_body: body,
            votes,
            points_count,
            created_at: now,
            updated_at: now,
        }
    }
}

// Tree operations live on the owning aggregate. Nodes are addressed by
// opaque ID and located by linear scan; discussions are small enough that
// nothing cleverer pays for itself.
impl Post {
    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn comment_mut(&mut self, comment_id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == comment_id)
    }

    /// Appends a comment and returns its ID.
    pub fn add_comment(&mut self, author: &str, body: String) -> String {
        let comment = Comment::new(author, body);
        let id = comment.id.clone();
        self.comments.push(comment);
        self.recount_comments();
        id
    }

    pub fn remove_comment(&mut self, comment_id: &str) -> Option<Comment> {
        let pos = self.comments.iter().position(|c| c.id == comment_id)?;
        let removed = self.comments.remove(pos);
        self.recount_comments();
        Some(removed)
    }

    /// Appends a reply under the given comment, returning the reply ID, or
    /// None when the comment does not exist.
    pub fn add_reply(&mut self, comment_id: &str, author: &str, body: String) -> Option<String> {
        let comment = self.comment_mut(comment_id)?;
        let reply = Reply::new(author, body);
        let id = reply.id.clone();
        comment.replies.push(reply);
        self.recount_comments();
        Some(id)
    }

    pub fn remove_reply(&mut self, comment_id: &str, reply_id: &str) -> Option<Reply> {
        let removed = self.comment_mut(comment_id)?.remove_reply(reply_id)?;
        self.recount_comments();
        Some(removed)
    }

    /// Comment count covers comments and their replies.
    pub fn recount_comments(&mut self) {
        self.comment_count = self
            .comments
            .iter()
            .map(|c| 1 + c.replies.len() as i64)
            .sum();
    }
}
