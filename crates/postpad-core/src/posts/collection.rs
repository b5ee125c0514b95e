//! Ordered, duplicate-free post list.

use std::collections::HashSet;

use crate::remote::{Post, PostDraft, PostId};

/// The signed-in user's posts, newest creates first.
///
/// No two posts share an id. Every lookup is by id, never by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostCollection {
    posts: Vec<Post>,
}

impl PostCollection {
    /// Builds a collection from a server listing, keeping server order.
    /// A repeated id keeps its first occurrence.
    pub fn from_server(posts: Vec<Post>) -> Self {
        let mut seen = HashSet::with_capacity(posts.len());
        let posts = posts
            .into_iter()
            .filter(|post| {
                let fresh = seen.insert(post.id.clone());
                if !fresh {
                    tracing::warn!(post_id = %post.id, "server listed a post twice; keeping the first");
                }
                fresh
            })
            .collect();
        Self { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    pub fn as_slice(&self) -> &[Post] {
        &self.posts
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.posts.iter().map(|p| p.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Inserts a newly created post at the front. An existing post with the
    /// same id is dropped first.
    pub fn prepend(&mut self, post: Post) {
        self.posts.retain(|p| p.id != post.id);
        self.posts.insert(0, post);
    }

    /// Replaces the post with the same id in place. Returns false if absent.
    pub fn replace(&mut self, post: Post) -> bool {
        match self.posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => {
                *slot = post;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Post> {
        let index = self.posts.iter().position(|p| p.id == id)?;
        Some(self.posts.remove(index))
    }

    pub fn clear(&mut self) {
        self.posts.clear();
    }
}

/// The single draft buffer for a new post or an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdit {
    /// `None` means "new post" mode.
    pub editing_id: Option<PostId>,
    pub title: String,
    pub content: String,
}

impl PendingEdit {
    pub fn for_post(post: &Post) -> Self {
        Self {
            editing_id: Some(post.id.clone()),
            title: post.title.clone(),
            content: post.content.clone(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.editing_id.is_none()
    }

    pub fn draft(&self) -> PostDraft {
        PostDraft::new(self.title.clone(), self.content.clone())
    }
}
