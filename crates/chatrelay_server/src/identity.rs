//! Caller identity forwarded by the gateway.
//!
//! Authentication happens upstream. The relay only reads the verified claims
//! to log who issued a request; a missing or malformed claims object never
//! fails the request.

use serde_json::Value;

/// Identity claims of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct CallerIdentity {
    /// `email` claim
    email: Option<String>,
    /// `cognito:username` claim
    username: Option<String>,
    /// `sub` claim
    subject: Option<String>,
}

impl CallerIdentity {
    /// Reads identity from a claims object.
    ///
    /// Returns `None` when `claims` is not an object or carries none of the
    /// recognized claims.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_server::CallerIdentity;
    /// use serde_json::json;
    ///
    /// let identity = CallerIdentity::from_claims(&json!({"cognito:username": "alice"})).unwrap();
    /// assert_eq!(identity.display_name(), "alice");
    /// assert!(CallerIdentity::from_claims(&json!("not claims")).is_none());
    /// ```
    pub fn from_claims(claims: &Value) -> Option<Self> {
        let claims = claims.as_object()?;
        let read = |key: &str| {
            claims
                .get(key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let identity = Self {
            email: read("email"),
            username: read("cognito:username"),
            subject: read("sub"),
        };

        if identity.email.is_none() && identity.username.is_none() && identity.subject.is_none() {
            None
        } else {
            Some(identity)
        }
    }

    /// Parses a JSON-encoded claims object, e.g. from a forwarded header.
    pub fn from_claims_json(raw: &str) -> Option<Self> {
        serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|claims| Self::from_claims(&claims))
    }

    /// Best available name: email, then username, then subject.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .or(self.subject.as_deref())
            .unwrap_or("unknown")
    }
}
