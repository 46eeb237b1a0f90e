//! Tolerant decoding of `Key: Value` manager messages
//!
//! Manager messages are flat header lists. Decoding never fails: lines
//! without a colon (the greeting banner, stray continuation text) are
//! skipped, whitespace around keys and values is trimmed, and a repeated
//! key keeps the last value seen. Insertion order is preserved so the
//! serialized form of a message reads like the wire did.

use indexmap::IndexMap;
use serde::Serialize;

/// One decoded manager message
///
/// Wraps an insertion-ordered key/value map. Serializes as a plain JSON
/// object, which is the shape the persistence layer stores verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawMessage {
    fields: IndexMap<String, String>,
}

impl RawMessage {
    /// Decode one delimiter-stripped block into a message
    ///
    /// Tolerant by contract: a block that is entirely banner or noise
    /// decodes to an empty message rather than an error.
    pub fn parse(block: &str) -> Self {
        let mut fields = IndexMap::new();
        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fields.insert(key.to_string(), value.trim().to_string());
        }
        Self { fields }
    }

    /// Look up a field by exact key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// First non-empty value among `keys`, in the order given
    ///
    /// The order of `keys` encodes precedence, not the order fields
    /// appeared on the wire.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }

    /// Whether this is a solicited reply rather than an unsolicited event
    ///
    /// Presence of the `Response` key is the discriminator; its value does
    /// not matter.
    pub fn is_response(&self) -> bool {
        self.fields.contains_key("Response")
    }

    /// The event name, for unsolicited event messages
    pub fn event(&self) -> Option<&str> {
        self.get("Event")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
