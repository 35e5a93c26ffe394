//! Domain DTOs for the storefront API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently so
//! integration tests catch drift. Response types keep unknown fields in
//! `extra`; the backend adds fields freely and the client must not drop them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A delivery location returned by `LOCATIONS.GET_ALL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query for the paginated location list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl LocationQuery {
    pub(crate) fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        pairs
    }
}

/// The signed-in user's profile, from `USER.PROFILE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub mobile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for `USER.UPDATE`. Omitted fields stay unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Payload for `AUTH.SEND_OTP`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOtp {
    pub mobile: String,
}

/// Payload for `AUTH.VERIFY_OTP_MOBILE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtp {
    pub mobile: String,
    pub otp: String,
}

/// `data` of a successful OTP verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedLogin {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// Payload for `CART.ADD_OR_UPDATE`. A quantity of zero removes the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_keeps_unknown_fields() {
        let location: Location = serde_json::from_value(json!({
            "_id": "l1",
            "name": "Guntur",
            "deliveryCharge": 40
        }))
        .unwrap();
        assert_eq!(location.id, "l1");
        assert!(location.pincode.is_none());
        assert_eq!(location.extra["deliveryCharge"], 40);
        let back = serde_json::to_value(&location).unwrap();
        assert_eq!(back["deliveryCharge"], 40);
    }

    #[test]
    fn cart_item_uses_camel_case() {
        let body = serde_json::to_value(CartItem {
            product_id: "p9".to_string(),
            quantity: 3,
        })
        .unwrap();
        assert_eq!(body, json!({"productId": "p9", "quantity": 3}));
    }

    #[test]
    fn update_profile_skips_unset_fields() {
        let body = serde_json::to_value(UpdateProfile {
            name: Some("Asha".to_string()),
            email: None,
        })
        .unwrap();
        assert_eq!(body, json!({"name": "Asha"}));
    }

    #[test]
    fn location_query_pairs_in_order() {
        let q = LocationQuery {
            page: Some(2),
            limit: None,
            search: Some("gun".to_string()),
        };
        assert_eq!(
            q.pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("search".to_string(), "gun".to_string())
            ]
        );
        assert!(LocationQuery::default().pairs().is_empty());
    }

    #[test]
    fn verified_login_without_user() {
        let login: VerifiedLogin = serde_json::from_value(json!({"token": "abc"})).unwrap();
        assert_eq!(login.token, "abc");
        assert!(login.user.is_none());
    }
}
