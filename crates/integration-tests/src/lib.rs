//! Integration test harness for Katale.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p katale-integration-tests
//! ```
//!
//! Nothing external is needed: each test starts a [`FakeMarketplace`] and a
//! real storefront router on ephemeral loopback ports, then drives the
//! storefront over HTTP with a cookie-enabled client. The session store is
//! in memory; signing in writes the identity straight into it, the way the
//! sign-in service writes into the shared `PostgreSQL` store.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use katale_storefront::api::IDEMPOTENCY_KEY_HEADER;
use katale_storefront::config::StorefrontConfig;
use katale_storefront::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use katale_storefront::models::session_keys;
use katale_storefront::routes;
use katale_storefront::state::AppState;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, redirect::Policy};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions::{MemoryStore, SessionStore};
use url::Url;

// =============================================================================
// Fake marketplace backend
// =============================================================================

/// How the fake answers `GET /api/delivery-zones`.
#[derive(Debug, Clone)]
pub enum ZonesBehaviour {
    /// Return these zone records.
    Zones(Vec<Value>),
    /// Answer 500 with a failure envelope.
    Fail,
}

/// How the fake answers `POST /api/orders`.
#[derive(Debug, Clone)]
pub enum OrdersBehaviour {
    /// Accept the order and return a receipt with this ID.
    Accept(String),
    /// Accept the order without returning a receipt.
    AcceptWithoutReceipt,
    /// Accept the order with a receipt in a shape the storefront does not know.
    AcceptWithForeignReceipt,
    /// Answer 500 with a failure envelope.
    Fail,
}

/// An order request as the backend received it.
#[derive(Debug, Clone)]
pub struct RecordedOrder {
    pub body: Value,
    pub idempotency_key: Option<String>,
}

#[derive(Debug)]
struct FakeState {
    zones: ZonesBehaviour,
    orders: OrdersBehaviour,
    zone_requests: usize,
    received: Vec<RecordedOrder>,
}

type Shared = Arc<Mutex<FakeState>>;

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-process stand-in for the marketplace REST API.
pub struct FakeMarketplace {
    addr: SocketAddr,
    state: Shared,
}

impl FakeMarketplace {
    /// Start the fake on an ephemeral port.
    pub async fn start(zones: ZonesBehaviour, orders: OrdersBehaviour) -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            zones,
            orders,
            zone_requests: 0,
            received: Vec::new(),
        }));

        let app = Router::new()
            .route("/api/delivery-zones", get(delivery_zones))
            .route("/api/orders", post(create_order))
            .with_state(Arc::clone(&state));

        let addr = serve(app).await;
        Self { addr, state }
    }

    /// Base URL to point the storefront at.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// Change how later order requests are answered.
    pub fn set_orders(&self, behaviour: OrdersBehaviour) {
        lock(&self.state).orders = behaviour;
    }

    /// Every order request received so far.
    #[must_use]
    pub fn orders(&self) -> Vec<RecordedOrder> {
        lock(&self.state).received.clone()
    }

    /// Number of zone listings served so far.
    #[must_use]
    pub fn zone_requests(&self) -> usize {
        lock(&self.state).zone_requests
    }
}

/// A zone record in the backend's wire format.
#[must_use]
pub fn zone(id: &str, name: &str, districts: &[&str], shipping_cost: u32, is_active: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "districts": districts,
        "shippingCost": shipping_cost,
        "isActive": is_active,
    })
}

async fn delivery_zones(State(state): State<Shared>) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    state.zone_requests += 1;

    match &state.zones {
        ZonesBehaviour::Zones(zones) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": zones })),
        ),
        ZonesBehaviour::Fail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "zone table unavailable" })),
        ),
    }
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    state.received.push(RecordedOrder {
        body,
        idempotency_key: headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    });

    match &state.orders {
        OrdersBehaviour::Accept(id) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": { "id": id, "status": "PENDING" } })),
        ),
        OrdersBehaviour::AcceptWithoutReceipt => {
            (StatusCode::OK, Json(json!({ "success": true })))
        }
        OrdersBehaviour::AcceptWithForeignReceipt => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "data": { "orderNumber": "KT-1", "status": "pending" },
            })),
        ),
        OrdersBehaviour::Fail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "payment provider timeout" })),
        ),
    }
}

// =============================================================================
// Storefront under test
// =============================================================================

/// A storefront router served on an ephemeral port, with a client that keeps
/// its session cookie and does not follow redirects.
pub struct TestStorefront {
    base_url: String,
    client: Client,
    cookies: Arc<Jar>,
    sessions: MemoryStore,
    shutdown: CancellationToken,
}

impl TestStorefront {
    /// Start a storefront talking to `marketplace`.
    pub async fn start(marketplace: &FakeMarketplace) -> Self {
        let shutdown = CancellationToken::new();
        let config = StorefrontConfig::for_api(marketplace.url());
        let state = AppState::new(config, shutdown.clone()).unwrap();

        let sessions = MemoryStore::default();
        let app = routes::routes()
            .layer(create_session_layer(sessions.clone(), state.config()))
            .with_state(state);

        let addr = serve(app).await;
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            base_url: format!("http://{addr}"),
            client,
            cookies,
            sessions,
            shutdown,
        }
    }

    /// Cancel work tied to server shutdown, as SIGTERM would.
    pub fn begin_shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// GET a page and return its body.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.unwrap()
    }

    /// Sign in as `user_id` the way the sign-in service does: write
    /// `user_session` into the shopper's record in the shared store, creating
    /// the record and its cookie when the shopper has none yet.
    pub async fn sign_in(&self, user_id: &str) {
        let user = json!({ "id": user_id, "name": "Test Shopper" });

        if let Some(id) = self.session_id() {
            let mut record = self.sessions.load(&id).await.unwrap().unwrap();
            record.data.insert(session_keys::CURRENT_USER.to_string(), user);
            self.sessions.save(&record).await.unwrap();
            return;
        }

        let mut record = Record {
            id: Id::default(),
            data: HashMap::from([(session_keys::CURRENT_USER.to_string(), user)]),
            expiry_date: OffsetDateTime::now_utc() + Duration::days(2),
        };
        self.sessions.create(&mut record).await.unwrap();
        self.cookies.add_cookie_str(
            &format!("{SESSION_COOKIE_NAME}={}; Path=/", record.id),
            &Url::parse(&self.base_url).unwrap(),
        );
    }

    /// The session ID this client's cookie points at, if any.
    fn session_id(&self) -> Option<Id> {
        let url = Url::parse(&self.base_url).unwrap();
        let header = self.cookies.cookies(&url)?;
        header
            .to_str()
            .ok()?
            .split("; ")
            .find_map(|pair| pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}=")))
            .and_then(|value| Id::from_str(value).ok())
    }

    /// Add a product to the cart.
    pub async fn add_to_cart(&self, product_id: &str, price: &str, quantity: &str) {
        let response = self
            .post_form(
                "/cart/add",
                &[
                    ("product_id", product_id),
                    ("name", "Test product"),
                    ("price", price),
                    ("vendor_id", "vendor_1"),
                    ("quantity", quantity),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    /// Current cart badge count.
    pub async fn cart_count(&self) -> String {
        let body = self.page("/cart/count").await;
        body.trim()
            .trim_start_matches("<span id=\"cart-count\">")
            .trim_end_matches("</span>")
            .to_string()
    }

    /// Submit valid shipping details for `district`.
    pub async fn submit_shipping(&self, district: &str) -> Response {
        self.post_form(
            "/checkout/shipping",
            &[
                ("full_name", "Nakato Sarah"),
                ("phone", "0772 123 456"),
                ("email", "nakato@example.ug"),
                ("address", "Plot 12, Kampala Road"),
                ("city", "Kampala"),
                ("district", district),
                ("postal_code", ""),
            ],
        )
        .await
    }

    /// Choose MTN Mobile Money with a valid number.
    pub async fn submit_mobile_money(&self) -> Response {
        self.post_form(
            "/checkout/payment",
            &[("method", "MTN_MOBILE_MONEY"), ("mobile_number", "0772123456")],
        )
        .await
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Location header of a redirect response.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
