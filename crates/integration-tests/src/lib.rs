//! Integration tests for Bazaar.
//!
//! Each test boots the real platform router on an ephemeral port, backed by
//! the in-memory document store and memory sessions, and drives it over
//! HTTP with `reqwest`. No database or external service is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_sessions::MemoryStore;

use bazaar_core::UserRole;
use bazaar_platform::db::MemoryDocumentStore;
use bazaar_platform::{AppState, PlatformConfig, build_app};

/// Password used for every account created by the helpers.
pub const PASSWORD: &str = "correct-horse-battery";

/// A running platform server.
pub struct TestContext {
    pub base_url: String,
    pub state: AppState,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start a server with the default in-memory configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start a server after adjusting its configuration.
    pub async fn with_config(configure: impl FnOnce(&mut PlatformConfig)) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let base_url = format!("http://{addr}");

        let mut config = PlatformConfig::in_memory(base_url.clone());
        configure(&mut config);

        let state = AppState::new(config, Arc::new(MemoryDocumentStore::new()), None)
            .expect("Failed to build app state");

        let app = build_app(state.clone(), MemoryStore::default());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            base_url,
            state,
            server,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A fresh client with its own cookie jar (one browser session).
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Register an account over HTTP and return a client logged in as it.
    pub async fn register(&self, email: &str, role: &str) -> Client {
        let client = self.client();
        let resp = client
            .post(self.url("/auth/register"))
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "displayName": "Test User",
                "role": role,
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED, "register {email}");
        client
    }

    /// Create an admin directly (admins cannot self-register) and log in.
    pub async fn admin(&self) -> Client {
        let email = "admin@bazaar.test";
        // A second call finds the account already registered
        let _ = self
            .state
            .auth()
            .register(email, PASSWORD, "Platform Admin", UserRole::Admin)
            .await;
        self.login(email).await
    }

    /// Log in an existing account.
    pub async fn login(&self, email: &str) -> Client {
        let client = self.client();
        let resp = client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to login");
        assert_eq!(resp.status(), StatusCode::OK, "login {email}");
        client
    }

    /// Submit a store application as `merchant` and return it.
    pub async fn apply(&self, merchant: &Client, email: &str, store_name: &str) -> Value {
        let resp = merchant
            .post(self.url("/api/applications"))
            .json(&application_form(email, store_name))
            .send()
            .await
            .expect("Failed to submit application");
        assert_eq!(resp.status(), StatusCode::CREATED, "apply {store_name}");
        resp.json().await.expect("Invalid application JSON")
    }

    /// Approve an application and return the new store.
    pub async fn approve(&self, admin: &Client, application_id: &str) -> Value {
        let resp = admin
            .post(self.url(&format!(
                "/api/admin/applications/{application_id}/approve"
            )))
            .send()
            .await
            .expect("Failed to approve application");
        assert_eq!(resp.status(), StatusCode::OK, "approve {application_id}");
        let body: Value = resp.json().await.expect("Invalid approval JSON");
        body["store"].clone()
    }

    /// Register a merchant, apply, approve, and return the merchant's client
    /// with its store.
    pub async fn merchant_with_store(&self, email: &str, store_name: &str) -> (Client, Value) {
        let merchant = self.register(email, "merchant").await;
        let application = self.apply(&merchant, email, store_name).await;
        let admin = self.admin().await;
        let id = application["id"].as_str().expect("application id");
        let store = self.approve(&admin, id).await;
        (merchant, store)
    }

    /// Create a product in the merchant's store.
    pub async fn create_product(&self, merchant: &Client, product: &Value) -> Value {
        let resp = merchant
            .post(self.url("/api/merchant/products"))
            .json(product)
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), StatusCode::CREATED, "create product");
        resp.json().await.expect("Invalid product JSON")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A valid application form.
#[must_use]
pub fn application_form(email: &str, store_name: &str) -> Value {
    json!({
        "merchantData": {
            "firstName": "Test",
            "lastName": "Merchant",
            "email": email,
            "phone": "+966500000000",
            "city": "Riyadh",
            "businessName": format!("{store_name} LLC"),
            "businessType": "retail"
        },
        "storeConfig": {
            "template": "modern",
            "customization": {
                "storeName": store_name,
                "storeDescription": "Integration test store",
                "colors": {
                    "primary": "#16a34a",
                    "secondary": "#6b7280",
                    "background": "#ffffff"
                }
            }
        }
    })
}

/// A checkout body paying cash on delivery.
#[must_use]
pub fn checkout_form(email: &str) -> Value {
    json!({
        "shippingAddress": {
            "firstName": "Sara",
            "lastName": "Ali",
            "email": email,
            "phone": "+966500000001",
            "street": "King Fahd Road 1",
            "city": "Riyadh",
            "country": "SA"
        },
        "paymentMethod": "cash_on_delivery"
    })
}
