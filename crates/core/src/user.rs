//! Identity record for the authenticated account.

use serde::{Deserialize, Deserializer, Serialize};

use crate::Role;

/// The user record as the rest of the application sees it.
///
/// Resolved authoritatively by the profile endpoint; the session layer
/// owns the copy consumers observe, and ephemeral views (forms) take
/// their own copies. Older server deployments emit `fullName` and
/// `phoneNumber`; both spellings map onto the same fields, and a
/// numeric `id` is coerced to its decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, alias = "fullName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, alias = "phoneNumber", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_admin)
    }
}

/// Accept a string or an integral id; servers have emitted both.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(id) => id,
        Raw::Number(id) => id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_legacy_field_names() {
        let user: User = serde_json::from_str(
            r#"{"id": 7, "email": "ana@example.com", "fullName": "Ana", "phoneNumber": "555-0100", "role": "ADMIN"}"#,
        )
        .unwrap();

        assert_eq!(user.id, "7");
        assert_eq!(user.name.as_deref(), Some("Ana"));
        assert_eq!(user.phone.as_deref(), Some("555-0100"));
        assert!(user.is_admin());
    }

    #[test]
    fn maps_current_field_names() {
        let user: User = serde_json::from_str(
            r#"{"id": "u-42", "email": "bo@example.com", "name": "Bo", "phone": "555-0101"}"#,
        )
        .unwrap();

        assert_eq!(user.id, "u-42");
        assert_eq!(user.name.as_deref(), Some("Bo"));
        assert!(!user.is_admin());
        assert!(user.role.is_none());
    }

    #[test]
    fn unset_fields_are_omitted_when_serialized() {
        let user = User {
            id: "u-1".to_string(),
            email: "cy@example.com".to_string(),
            name: None,
            phone: None,
            role: Some(Role::USER),
            avatar: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(object.contains_key("id"));
        assert!(object.contains_key("email"));
        assert!(object.contains_key("role"));
    }
}
