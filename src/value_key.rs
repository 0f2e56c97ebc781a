//! `ValueKey`: opaque identifier of a tuple's value-combination on a given
//! attribute set.
//!
//! For a single attribute, a `ValueKey` is the column's dense re-encoding
//! (`1..=distinct`, first-seen order). For a composite set it is a hash of
//! the two parent keys, combined with a 128-bit hash (`xxh3_128`) rather
//! than a narrower one, trading a few bytes of key width for a collision
//! probability low enough to ignore in practice.

use std::collections::HashMap;

use xxhash_rust::xxh3::xxh3_128;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueKey(pub u128);

impl ValueKey {
    /// Combine two parent keys into the key for their union attribute set.
    pub fn combine(a: ValueKey, b: ValueKey) -> ValueKey {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&a.0.to_le_bytes());
        bytes[16..].copy_from_slice(&b.0.to_le_bytes());
        ValueKey(xxh3_128(&bytes))
    }
}

/// Dense re-encoder: assigns each distinct [`Value`] seen a key `1..=d` in
/// first-seen order. Used during level-1 initialization of both engines.
#[derive(Debug, Default)]
pub struct DenseEncoder {
    assigned: HashMap<Value, u128>,
    next: u128,
}

impl DenseEncoder {
    pub fn new() -> Self {
        DenseEncoder { assigned: HashMap::new(), next: 1 }
    }

    pub fn encode(&mut self, value: &Value) -> ValueKey {
        if let Some(&key) = self.assigned.get(value) {
            return ValueKey(key);
        }
        let key = self.next;
        self.next += 1;
        self.assigned.insert(value.clone(), key);
        ValueKey(key)
    }

    pub fn distinct_count(&self) -> usize {
        self.assigned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_encoder_assigns_in_first_seen_order() {
        let mut enc = DenseEncoder::new();
        let a = enc.encode(&Value::Int64(10));
        let b = enc.encode(&Value::Int64(20));
        let a_again = enc.encode(&Value::Int64(10));
        assert_eq!(a.0, 1);
        assert_eq!(b.0, 2);
        assert_eq!(a_again, a);
        assert_eq!(enc.distinct_count(), 2);
    }

    #[test]
    fn combine_is_order_sensitive_but_deterministic() {
        let a = ValueKey(7);
        let b = ValueKey(9);
        let ab1 = ValueKey::combine(a, b);
        let ab2 = ValueKey::combine(a, b);
        assert_eq!(ab1, ab2);
        // Not required to equal combine(b, a); just must be deterministic
        // for a fixed input order, which both engines always apply
        // consistently (parent set's key, then new column's key).
    }
}
