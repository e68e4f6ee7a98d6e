//! Dedup key generation for notification suppression
//!
//! Keys answer "is this the same notification we just sent?" within one
//! dedup epoch. A key is a hash over (network, channel, sender, body
//! prefix); the body only contributes its first `BODY_PREFIX_CHARS`
//! characters, so two messages that differ beyond that point map to the
//! same key on purpose. This is a grouping heuristic for spammy repeats
//! (bot floods, relay echoes), not a message identity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::message::Message;

/// Number of leading body characters that contribute to the key.
pub const BODY_PREFIX_CHARS: usize = 50;

/// Generate the dedup key for a message
///
/// Deterministic: the same (network, channel, sender, body prefix) always
/// yields the same key. The prefix is truncated by character, not byte,
/// so multi-byte bodies never split a code point.
pub fn dedup_key(message: &Message) -> String {
    let prefix: String = message.body.chars().take(BODY_PREFIX_CHARS).collect();

    let mut hasher = DefaultHasher::new();
    message.network.hash(&mut hasher);
    message.channel.hash(&mut hasher);
    message.sender.hash(&mut hasher);
    prefix.hash(&mut hasher);

    format!("{:016x}", hasher.finish())
}
