use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::value::scalar_to_string;

/// Role shown when the backend does not send one.
pub const DEFAULT_ROLE: &str = "user";

/// The user profile returned by a verification endpoint.
///
/// The backend sends the whole user document minus secrets, so anything beyond
/// the identity fields is kept in `extra` and written back verbatim when the
/// session is persisted.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Construct a profile with only the identity fields set.
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        email: Option<String>,
        role: Option<String>,
    ) -> Self {
        UserProfile {
            id: id.into(),
            name,
            email,
            role,
            extra: Map::new(),
        }
    }

    /// Build a profile from a JSON user object.
    ///
    /// `id` falls back to `user_id`, and scalar ids (numbers, booleans) are
    /// stringified. `name`, `email` and `role` are taken only when they are
    /// strings, exactly as sent; anything else stays in `extra`. Empty strings
    /// count as absent.
    pub fn from_json(value: Value) -> Result<Self, String> {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Err(format!("user must be a JSON object, got {}", other)),
        };

        let id = take_id(&mut map)
            .or_else(|| map.get("user_id").cloned().and_then(scalar_to_string))
            .unwrap_or_default();

        let name = take_string(&mut map, "name");
        let email = take_string(&mut map, "email");
        let role = take_string(&mut map, "role");

        Ok(UserProfile {
            id,
            name,
            email,
            role,
            extra: map,
        })
    }

    /// The label used wherever the UI says who is logged in.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }

    /// The role, or `"user"` when the backend did not send one.
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    /// Serialize to a JSON object map so callers can attach scheme metadata.
    pub(crate) fn to_json_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A struct with a flattened map always serializes to an object.
            _ => Map::new(),
        }
    }
}

impl<'de> Deserialize<'de> for UserProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        UserProfile::from_json(value).map_err(de::Error::custom)
    }
}

fn take_id(map: &mut Map<String, Value>) -> Option<String> {
    match map.get("id") {
        Some(Value::Object(_) | Value::Array(_)) | None => None,
        Some(_) => map.remove("id").and_then(scalar_to_string),
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(_)) => match map.remove(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        },
        _ => None,
    }
}
