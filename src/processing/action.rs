//! Held-key to action-vector encoding
//!
//! Every channel of the keymap is an independent OR-mask over its aliases, so a
//! raw key listed under two channels activates both.

use crate::config::KeymapEntry;
use std::collections::BTreeSet;

/// Multi-hot action vector, positionally aligned with the keymap
pub type ActionVector = Vec<u8>;

/// Encode a held-key snapshot against the keymap.
///
/// Index `i` is 1 iff at least one alias of `keymap[i]` is held.
pub fn encode_action(held: &BTreeSet<String>, keymap: &[KeymapEntry]) -> ActionVector {
    keymap
        .iter()
        .map(|entry| u8::from(entry.aliases.iter().any(|alias| held.contains(alias))))
        .collect()
}

/// Names of the channels that are set in `action`
pub fn active_channels<'a>(action: &[u8], keymap: &'a [KeymapEntry]) -> Vec<&'a str> {
    keymap
        .iter()
        .zip(action)
        .filter(|(_, bit)| **bit == 1)
        .map(|(entry, _)| entry.name.as_str())
        .collect()
}
