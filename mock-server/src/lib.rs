//! In-process stand-in for the storefront backend.
//!
//! Answers every route with the `{ success, message, data }` envelope, guards
//! user and cart routes with bearer tokens, and falls back to a plain-text
//! `Invalid API` 404 for paths it does not know.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Mount path every route lives under.
pub const MOUNT: &str = "/nvs-rice-mart";

/// The one OTP the mock accepts.
pub const VALID_OTP: &str = "123456";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub pincode: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct SendOtp {
    pub mobile: String,
}

#[derive(Deserialize)]
pub struct VerifyOtp {
    pub mobile: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct LocationQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
}

#[derive(Debug, Default)]
pub struct Backend {
    locations: Vec<Location>,
    pending_otps: HashSet<String>,
    /// token → mobile
    sessions: HashMap<String, String>,
    /// mobile → user
    users: HashMap<String, User>,
    /// mobile → cart
    carts: HashMap<String, Vec<CartLine>>,
}

impl Backend {
    pub fn seeded() -> Self {
        let locations = [
            ("Guntur", "522001"),
            ("Vijayawada", "520001"),
            ("Tenali", "522201"),
            ("Ongole", "523001"),
            ("Nellore", "524001"),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (name, pincode))| Location {
            id: format!("loc-{}", i + 1),
            name: name.to_string(),
            pincode: pincode.to_string(),
        })
        .collect();
        Self {
            locations,
            ..Self::default()
        }
    }

    /// Register a session directly, bypassing the OTP flow.
    pub fn issue_token(&mut self, mobile: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.users.entry(mobile.to_string()).or_insert_with(|| User {
            id: Uuid::new_v4().to_string(),
            mobile: mobile.to_string(),
            name: None,
            email: None,
        });
        self.sessions.insert(token.clone(), mobile.to_string());
        token
    }
}

pub type Db = Arc<RwLock<Backend>>;

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Backend::seeded())))
}

pub fn app_with(db: Db) -> Router {
    let api = Router::new()
        .route("/locations/getAll", get(list_locations))
        .route("/users/get", get(get_user))
        .route("/users/update", post(update_user))
        .route("/auth/send-otp", post(send_otp))
        .route("/auth/verify-otp-mobile", post(verify_otp))
        .route("/carts/add-or-update", post(add_or_update_cart));
    Router::new()
        .nest(MOUNT, api)
        .fallback(invalid_api)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn envelope(status: StatusCode, success: bool, message: &str, data: Option<Value>) -> Response {
    let mut body = json!({ "success": success, "message": message });
    if let Some(data) = data {
        body["data"] = data;
    }
    (status, Json(body)).into_response()
}

fn ok(message: &str, data: Value) -> Response {
    envelope(StatusCode::OK, true, message, Some(data))
}

fn unauthorized() -> Response {
    envelope(StatusCode::UNAUTHORIZED, false, "Unauthorized", None)
}

/// Mobile number of the session behind the bearer token, if any.
fn authenticate(headers: &HeaderMap, backend: &Backend) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    backend.sessions.get(token).cloned()
}

fn is_mobile(mobile: &str) -> bool {
    mobile.len() == 10 && mobile.chars().all(|c| c.is_ascii_digit())
}

async fn invalid_api() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Invalid API")
}

async fn list_locations(State(db): State<Db>, Query(query): Query<LocationQuery>) -> Response {
    let backend = db.read().await;
    let search = query.search.map(|s| s.to_lowercase());
    let matching: Vec<&Location> = backend
        .locations
        .iter()
        .filter(|l| {
            search
                .as_deref()
                .map_or(true, |s| l.name.to_lowercase().contains(s))
        })
        .collect();

    let limit = query.limit.unwrap_or(10).max(1);
    let page = query.page.unwrap_or(1).max(1);
    let total = matching.len();
    let total_pages = total.div_ceil(limit);
    let items: Vec<&Location> = matching
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    ok(
        "Locations fetched",
        json!({ "total": total, "totalPages": total_pages, "data": items }),
    )
}

async fn get_user(State(db): State<Db>, headers: HeaderMap) -> Response {
    let backend = db.read().await;
    let Some(mobile) = authenticate(&headers, &backend) else {
        return unauthorized();
    };
    match backend.users.get(&mobile) {
        Some(user) => ok("User fetched", json!(user)),
        None => envelope(StatusCode::NOT_FOUND, false, "User not found", None),
    }
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UpdateUser>,
) -> Response {
    let mut backend = db.write().await;
    let Some(mobile) = authenticate(&headers, &backend) else {
        return unauthorized();
    };
    let Some(user) = backend.users.get_mut(&mobile) else {
        return envelope(StatusCode::NOT_FOUND, false, "User not found", None);
    };
    if let Some(name) = input.name {
        user.name = Some(name);
    }
    if let Some(email) = input.email {
        user.email = Some(email);
    }
    ok("Profile updated", json!(user))
}

async fn send_otp(State(db): State<Db>, Json(input): Json<SendOtp>) -> Response {
    if !is_mobile(&input.mobile) {
        return envelope(StatusCode::BAD_REQUEST, false, "Invalid mobile number", None);
    }
    db.write().await.pending_otps.insert(input.mobile);
    envelope(StatusCode::OK, true, "OTP sent", None)
}

async fn verify_otp(State(db): State<Db>, Json(input): Json<VerifyOtp>) -> Response {
    let mut backend = db.write().await;
    if !backend.pending_otps.contains(&input.mobile) {
        return envelope(StatusCode::OK, false, "OTP not requested", None);
    }
    if input.otp != VALID_OTP {
        return envelope(StatusCode::OK, false, "Invalid OTP", None);
    }
    backend.pending_otps.remove(&input.mobile);
    let token = backend.issue_token(&input.mobile);
    let user = backend.users.get(&input.mobile).cloned();
    ok("OTP verified", json!({ "token": token, "user": user }))
}

async fn add_or_update_cart(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CartLine>,
) -> Response {
    let mut backend = db.write().await;
    let Some(mobile) = authenticate(&headers, &backend) else {
        return unauthorized();
    };
    let cart = backend.carts.entry(mobile).or_default();
    match cart.iter_mut().find(|l| l.product_id == input.product_id) {
        Some(line) => line.quantity = input.quantity,
        None => cart.push(input),
    }
    cart.retain(|l| l.quantity > 0);
    ok("Cart updated", json!({ "items": cart }))
}
