//! Ephemeral reference cache
//!
//! Maps short opaque tokens to full source references (URLs or
//! provider-native identifiers) so that only tokens ever cross the
//! size-constrained control-channel boundary (~64 byte button payloads).
//!
//! Keys are namespaced per scope (conversation/session id) so concurrent
//! sessions can never observe each other's tokens. Entries expire after a
//! short TTL; expired entries are dropped lazily on access and swept on
//! `put`.

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Strict-resolution failure: the token was never cached or has expired.
#[derive(Debug, Error)]
#[error("reference token '{token}' expired or unknown in scope {scope_id}")]
pub struct CacheMiss {
    pub token: String,
    pub scope_id: i64,
}

struct Entry {
    reference: String,
    expires_at: Instant,
}

/// In-process TTL key/value store for reference indirection.
pub struct ReferenceCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl ReferenceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `full_reference` under a fresh random token and return the token.
    ///
    /// Tokens carry 8 bytes of entropy (16 hex chars), well under the
    /// control-channel payload limit.
    pub async fn put(&self, full_reference: &str, scope_id: i64) -> String {
        let token = generate_token();
        let mut entries = self.entries.lock().await;

        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);

        entries.insert(
            scoped_key(scope_id, &token),
            Entry {
                reference: full_reference.to_string(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Resolve a token, falling back to the input on miss.
    ///
    /// The pass-through tolerates references that are natively short and
    /// were never cached (e.g. transport attachment file ids).
    pub async fn resolve(&self, token: &str, scope_id: i64) -> String {
        match self.lookup(token, scope_id).await {
            Some(reference) => reference,
            None => token.to_string(),
        }
    }

    /// Resolve a token, failing loudly on miss.
    pub async fn resolve_strict(&self, token: &str, scope_id: i64) -> Result<String, CacheMiss> {
        self.lookup(token, scope_id).await.ok_or_else(|| CacheMiss {
            token: token.to_string(),
            scope_id,
        })
    }

    async fn lookup(&self, token: &str, scope_id: i64) -> Option<String> {
        let key = scoped_key(scope_id, token);
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.reference.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }
}

fn scoped_key(scope_id: i64, token: &str) -> String {
    format!("{}:{}", scope_id, token)
}

fn generate_token() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(120);

    #[tokio::test]
    async fn test_put_then_resolve_roundtrip() {
        let cache = ReferenceCache::new(TTL);
        let token = cache.put("https://example.com/a/very/long/reference", 7).await;

        assert_eq!(token.len(), 16);
        assert_eq!(
            cache.resolve(&token, 7).await,
            "https://example.com/a/very/long/reference"
        );
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_input_on_miss() {
        let cache = ReferenceCache::new(TTL);
        assert_eq!(cache.resolve("native-file-id-42", 7).await, "native-file-id-42");
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let cache = ReferenceCache::new(TTL);
        let token = cache.put("https://example.com/track.mp3", 7).await;

        // Same token under a different scope misses and passes through
        assert_eq!(cache.resolve(&token, 8).await, token);
        assert!(cache.resolve_strict(&token, 8).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ReferenceCache::new(TTL);
        let token = cache.put("https://example.com/track.mp3", 7).await;

        tokio::time::advance(Duration::from_secs(119)).await;
        assert_eq!(cache.resolve(&token, 7).await, "https://example.com/track.mp3");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.resolve(&token, 7).await, token);
        assert!(cache.resolve_strict(&token, 7).await.is_err());
    }

    #[tokio::test]
    async fn test_tokens_do_not_collide_within_scope() {
        let cache = ReferenceCache::new(TTL);
        let mut tokens = std::collections::HashSet::new();
        for i in 0..200 {
            let token = cache.put(&format!("https://example.com/{}", i), 7).await;
            assert!(tokens.insert(token), "token collision");
        }
    }

    #[tokio::test]
    async fn test_resolve_strict_hits_before_ttl() {
        let cache = ReferenceCache::new(TTL);
        let token = cache.put("ref", 3).await;
        assert_eq!(cache.resolve_strict(&token, 3).await.unwrap(), "ref");
    }
}
