//! Document types for the five bistro collections.
//!
//! Documents are schema-flexible: each type names the fields the server
//! reasons about (`_id`, `email`, `role`, `price`) and carries the rest in a
//! flattened BSON tail. `_id` deserializes from the store's native ObjectId
//! and serializes to JSON as the 24-char hex string API clients expect.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize, Serializer};

/// Serialize an optional ObjectId as its hex string.
///
/// Only used on the JSON response path; documents written to the store never
/// carry a pre-assigned `_id` (the driver generates one on insert).
fn oid_as_hex<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(oid) => serializer.serialize_str(&oid.to_hex()),
        None => serializer.serialize_none(),
    }
}

/// The only named role; a user without one has no elevated access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

/// Account record keyed by email; `email` carries a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "oid_as_hex"
    )]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(flatten)]
    pub profile: Document,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "oid_as_hex"
    )]
    pub id: Option<ObjectId>,
    #[serde(flatten)]
    pub item: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "oid_as_hex"
    )]
    pub id: Option<ObjectId>,
    #[serde(flatten)]
    pub review: Document,
}

/// A menu item placed in a user's cart. Ownership is just the `email` field;
/// listing trusts the caller-supplied email and filters by equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "oid_as_hex"
    )]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(flatten)]
    pub item: Document,
}

/// Completed payment record. Written by an external collaborator; this
/// server only reads payments in aggregate for statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "oid_as_hex"
    )]
    pub id: Option<ObjectId>,
    pub price: f64,
    #[serde(flatten)]
    pub details: Document,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use mongodb::bson::{doc, from_document, oid::ObjectId};
    use serde_json::{json, Value};

    use super::{Role, User};

    #[test]
    fn user_deserializes_from_store_document() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "email": "alice@example.com",
            "role": "admin",
            "name": "Alice",
        };

        let user: User = from_document(document).unwrap();

        assert_eq!(user.id, Some(id));
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Some(Role::Admin));
        assert!(user.is_admin());
        assert_eq!(user.profile.get_str("name").unwrap(), "Alice");
    }

    #[test]
    fn user_serializes_id_as_hex_string() {
        let id = ObjectId::new();
        let user: User = from_document(doc! { "_id": id, "email": "a@b.c" }).unwrap();

        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value.get("_id"), Some(&Value::String(id.to_hex())));
        assert_eq!(value.get("role"), None);
    }

    #[test]
    fn user_from_request_body_has_no_id_and_keeps_profile_fields() {
        let body = json!({
            "email": "bob@example.com",
            "name": "Bob",
            "photoURL": "https://example.com/bob.png",
        });

        let user: User = serde_json::from_value(body).unwrap();

        assert_eq!(user.id, None);
        assert_eq!(user.role, None);
        assert!(!user.is_admin());
        assert_eq!(user.profile.get_str("name").unwrap(), "Bob");
    }

    #[test]
    fn role_other_than_admin_is_not_admin() {
        let user: User = from_document(doc! { "email": "c@d.e" }).unwrap();
        assert!(!user.is_admin());
    }
}
