//! Text search over users, posts, and hashtags.
//!
//! Each field keeps an inverted index from token to posting set,
//! stored in a `BTreeMap` so a prefix query is one sorted range
//! scan. Indexing is append-only per new entity; entities are never
//! deleted in this core, so no removal path exists.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use storroz_core::token::tokenize;
use storroz_core::{CoreError, HashtagId, PostId, Result, UserId};

/// A ranked search match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit<T> {
    pub id: T,
    /// Distinct query tokens this entity matched.
    pub matched_tokens: usize,
}

/// Inverted index over one text field.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct TokenIndex {
    /// Token to posting set. Sorted keys make prefix lookup a range
    /// scan from the query to the first non-prefixed key.
    postings: BTreeMap<String, BTreeSet<u64>>,
}

impl TokenIndex {
    fn insert(&mut self, text: &str, id: u64) {
        for token in tokenize(text) {
            self.postings.entry(token).or_default().insert(id);
        }
    }

    /// Ids posted under exactly `token`.
    fn exact(&self, token: &str) -> BTreeSet<u64> {
        self.postings.get(token).cloned().unwrap_or_default()
    }

    /// Ids posted under any token with `prefix` as a prefix.
    fn prefix(&self, prefix: &str) -> BTreeSet<u64> {
        self.postings
            .range(prefix.to_string()..)
            .take_while(|(token, _)| token.starts_with(prefix))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Ranks entities matching the query: distinct matched query
    /// tokens descending, then descending id. Ids ascend with
    /// creation time, so the id tiebreak is most-recent-first.
    fn search(&self, query: &str) -> Result<Vec<SearchHit<u64>>> {
        let mut tokens = tokenize(query);
        tokens.sort();
        tokens.dedup();
        if tokens.is_empty() {
            return Err(CoreError::InvalidArgument(format!(
                "query '{}' has no searchable tokens",
                query
            )));
        }

        let mut matched: HashMap<u64, usize> = HashMap::new();
        for token in &tokens {
            for id in self.prefix(token) {
                *matched.entry(id).or_insert(0) += 1;
            }
        }

        let mut hits: Vec<SearchHit<u64>> = matched
            .into_iter()
            .map(|(id, matched_tokens)| SearchHit { id, matched_tokens })
            .collect();
        hits.sort_by(|a, b| {
            b.matched_tokens
                .cmp(&a.matched_tokens)
                .then(b.id.cmp(&a.id))
        });
        Ok(hits)
    }

    fn token_count(&self) -> usize {
        self.postings.len()
    }
}

/// The three field indexes: usernames, post content, hashtag names.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SearchCatalog {
    users: TokenIndex,
    posts: TokenIndex,
    hashtags: TokenIndex,
}

impl SearchCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a new user's username.
    pub fn index_user(&mut self, id: UserId, username: &str) {
        self.users.insert(username, id.get());
    }

    /// Indexes a new post's content.
    pub fn index_post(&mut self, id: PostId, content: &str) {
        self.posts.insert(content, id.get());
    }

    /// Indexes a new hashtag's name.
    pub fn index_hashtag(&mut self, id: HashtagId, name: &str) {
        self.hashtags.insert(name, id.get());
    }

    /// Searches usernames. Fails `InvalidArgument` on an empty query.
    pub fn search_users(&self, query: &str) -> Result<Vec<SearchHit<UserId>>> {
        Ok(self
            .users
            .search(query)?
            .into_iter()
            .map(|hit| SearchHit {
                id: UserId(hit.id),
                matched_tokens: hit.matched_tokens,
            })
            .collect())
    }

    /// Searches post content. Fails `InvalidArgument` on an empty query.
    pub fn search_posts(&self, query: &str) -> Result<Vec<SearchHit<PostId>>> {
        Ok(self
            .posts
            .search(query)?
            .into_iter()
            .map(|hit| SearchHit {
                id: PostId(hit.id),
                matched_tokens: hit.matched_tokens,
            })
            .collect())
    }

    /// Searches hashtag names. Fails `InvalidArgument` on an empty query.
    pub fn search_hashtags(&self, query: &str) -> Result<Vec<SearchHit<HashtagId>>> {
        Ok(self
            .hashtags
            .search(query)?
            .into_iter()
            .map(|hit| SearchHit {
                id: HashtagId(hit.id),
                matched_tokens: hit.matched_tokens,
            })
            .collect())
    }

    /// Distinct token counts per field: (users, posts, hashtags).
    pub fn token_counts(&self) -> (usize, usize, usize) {
        (
            self.users.token_count(),
            self.posts.token_count(),
            self.hashtags.token_count(),
        )
    }
}
