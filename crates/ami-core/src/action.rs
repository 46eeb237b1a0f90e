//! Encoding of client actions onto the manager wire
//!
//! The client side of the protocol is tiny: an action is the same flat
//! `Key: Value` shape as inbound messages, led by an `Action` header and
//! closed by a blank line.

/// Builder for one outbound manager action
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    fields: Vec<(String, String)>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append one header to the action
    ///
    /// Field order is preserved on the wire.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// The `Login` action, with the full event stream enabled
    pub fn login(username: &str, secret: &str) -> Self {
        Self::new("Login")
            .field("Username", username)
            .field("Secret", secret)
            .field("Events", "on")
    }

    /// Serialize to the exact byte sequence the manager expects
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        out.push_str("Action: ");
        out.push_str(&self.name);
        out.push_str("\r\n");
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out
    }
}
