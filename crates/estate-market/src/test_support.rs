//! Fixtures shared by the per-area test modules.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::accounts::{AccountRepository, Actor, SignupRequest, User, UserRole};
use crate::billing::{
    GatewayError, InitializeRequest, InitializedTransaction, PaymentGateway, VerifiedTransaction,
};
use crate::config::{AuthConfig, MailConfig, PaystackConfig};
use crate::listings::{Property, PropertyDraft};
use crate::shared::UserId;
use crate::store::{MemoryMailer, MemoryStore};
use crate::Marketplace;

pub(crate) const WEBHOOK_SECRET: &str = "sk_test_fixture";

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn paystack_config() -> PaystackConfig {
    PaystackConfig {
        secret_key: WEBHOOK_SECRET.to_string(),
        base_url: "https://api.paystack.test".to_string(),
        timeout: Duration::from_secs(5),
        callback_url: "http://localhost:3000/api/v1/subscriptions/verify".to_string(),
    }
}

/// Scripted gateway: hands out sequential references and reports whatever
/// status the test sets.
#[derive(Debug)]
pub(crate) struct FakeGateway {
    status: Mutex<String>,
    initialized: Mutex<Vec<InitializeRequest>>,
    offline: bool,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            status: Mutex::new("success".to_string()),
            initialized: Mutex::new(Vec::new()),
            offline: false,
        }
    }
}

impl FakeGateway {
    pub(crate) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(crate) fn report_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    pub(crate) fn initialized(&self) -> Vec<InitializeRequest> {
        self.initialized.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializedTransaction, GatewayError> {
        if self.offline {
            return Err(GatewayError::Network("connection refused".to_string()));
        }
        let mut initialized = self.initialized.lock().unwrap();
        initialized.push(request);
        let reference = format!("ref-{}", initialized.len());
        Ok(InitializedTransaction {
            authorization_url: Some(format!("https://checkout.paystack.test/{reference}")),
            access_code: Some("access".to_string()),
            reference: Some(reference),
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        if self.offline {
            return Err(GatewayError::Network("connection refused".to_string()));
        }
        let amount = self
            .initialized
            .lock()
            .unwrap()
            .last()
            .map(|request| request.amount)
            .unwrap_or(0);
        Ok(VerifiedTransaction {
            reference: reference.to_string(),
            status: self.status.lock().unwrap().clone(),
            amount,
            metadata: None,
        })
    }
}

pub(crate) struct Fixture {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) mailer: Arc<MemoryMailer>,
    pub(crate) gateway: Arc<FakeGateway>,
    pub(crate) market: Marketplace,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_gateway(FakeGateway::default())
    }

    pub(crate) fn with_gateway(gateway: FakeGateway) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(MemoryMailer::default());
        let gateway = Arc::new(gateway);
        let market = Marketplace::new(
            store.clone(),
            mailer.clone(),
            gateway.clone(),
            &AuthConfig {
                jwt_secret: "fixture-secret".to_string(),
                token_ttl_hours: 1,
            },
            paystack_config(),
            MailConfig::default(),
        );
        Self {
            store,
            mailer,
            gateway,
            market,
        }
    }

    fn signup(&self, name: &str, role: UserRole) -> Actor {
        let email = format!(
            "{}@example.com",
            name.to_ascii_lowercase().replace(' ', ".")
        );
        self.market
            .accounts()
            .signup(
                SignupRequest {
                    email,
                    name: name.to_string(),
                    role: Some(role),
                },
                now(),
            )
            .expect("signup")
            .user
            .actor()
    }

    pub(crate) fn customer(&self, name: &str) -> Actor {
        self.signup(name, UserRole::Customer)
    }

    /// Agent still waiting for staff approval, on the Basic trial.
    pub(crate) fn pending_agent(&self, name: &str) -> Actor {
        self.signup(name, UserRole::Agent)
    }

    pub(crate) fn agent(&self, name: &str) -> Actor {
        let agent = self.pending_agent(name);
        self.market
            .accounts()
            .verify_agent(&self.staff(), agent.user_id, true)
            .expect("approve agent");
        agent
    }

    pub(crate) fn staff(&self) -> Actor {
        let email = "staff@example.com";
        if let Some(existing) = self.store.user_by_email(email).expect("lookup") {
            return existing.actor();
        }
        self.store
            .insert_user(User {
                id: UserId::new(),
                email: email.to_string(),
                name: "Site Staff".to_string(),
                role: None,
                is_staff: true,
                created_at: now(),
            })
            .expect("insert staff")
            .actor()
    }

    pub(crate) fn user(&self, actor: &Actor) -> User {
        self.store
            .user(actor.user_id)
            .expect("lookup")
            .expect("user exists")
    }

    pub(crate) fn token(&self, actor: &Actor) -> String {
        self.market
            .tokens()
            .issue(&self.user(actor), now())
            .expect("token")
    }

    pub(crate) fn property(&self, agent: &Actor, title: &str) -> Property {
        self.market
            .listings()
            .create_property(agent, draft(title), now())
            .expect("create property")
    }

    pub(crate) fn subjects(&self) -> Vec<String> {
        self.mailer.subjects()
    }

    pub(crate) fn mailed(&self, subject: &str) -> bool {
        self.subjects().iter().any(|sent| sent.ends_with(subject))
    }
}

pub(crate) fn draft(title: &str) -> PropertyDraft {
    PropertyDraft {
        title: title.to_string(),
        description: "Bright rooms with a balcony".to_string(),
        property_type: Some("apartment".to_string()),
        new_property_type: None,
        price: 1_200_000,
        location: "Lekki, Lagos".to_string(),
        bedrooms: 3,
        bathrooms: 2,
        sqft: 1400,
        amenities: Vec::new(),
        is_available: true,
    }
}

pub(crate) fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub(crate) async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
