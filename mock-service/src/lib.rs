//! In-memory authentication service with failure injection.
use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub mod prelude {
    pub use crate::{MockConfig, MockService, User};
}

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Added to every register and login request before it is handled.
    pub delay: Duration,
    /// Share of register/login requests handled normally. The others are answered with 503,
    /// spread evenly over the request sequence.
    pub success_percent: u32,
    /// Answer successful logins without a `token` field.
    pub omit_token: bool,
    /// Register/login requests above this rate are answered with 429.
    pub max_tps: Option<NonZeroU32>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            success_percent: 100,
            omit_token: false,
            max_tps: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub is_active: bool,
    pub roles: String,
}

struct MockState {
    config: MockConfig,
    users: RwLock<HashMap<String, User>>,
    requests: AtomicU64,
    admitted: AtomicU64,
    issued: AtomicU64,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl MockState {
    fn new(config: MockConfig) -> Self {
        let limiter = config
            .max_tps
            .map(|tps| RateLimiter::direct(Quota::per_second(tps)));
        Self {
            config,
            users: RwLock::new(HashMap::new()),
            requests: AtomicU64::new(0),
            admitted: AtomicU64::new(0),
            issued: AtomicU64::new(0),
            limiter,
        }
    }

    /// Apply the configured delay, rate limit and failure injection.
    async fn admit(&self) -> Result<(), Reply> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                debug!("MOCK SERVER ___ RATE LIMITED");
                return Err(reply(StatusCode::TOO_MANY_REQUESTS, "Too many requests"));
            }
        }

        let n = self.admitted.fetch_add(1, Ordering::Relaxed);
        if !passes(n, self.config.success_percent) {
            debug!("MOCK SERVER ___ INJECTED FAILURE");
            return Err(reply(StatusCode::SERVICE_UNAVAILABLE, "Injected failure"));
        }

        Ok(())
    }
}

/// Whether request `n` of the sequence is let through at `percent` success. Over any window of
/// 100 consecutive requests exactly `percent` pass.
fn passes(n: u64, percent: u32) -> bool {
    let percent = u64::from(percent.min(100));
    (n + 1) * percent / 100 > n * percent / 100
}

type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(json!({
            "message": message,
            "statusCode": status.as_u16(),
        })),
    )
}

/// A running mock service bound to an ephemeral local port.
pub struct MockService {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockService {
    pub async fn spawn(config: MockConfig) -> anyhow::Result<Self> {
        let state = Arc::new(MockState::new(config));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = router(state.clone());
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!("Mock service stopped: {err}");
            }
        });

        Ok(Self { addr, state })
    }

    /// Base URL of the auth routes, e.g. `http://127.0.0.1:41234/auth`.
    pub fn base_url(&self) -> String {
        format!("http://{}/auth", self.addr)
    }

    /// Register and login requests received so far.
    pub fn request_count(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }

    pub fn user_count(&self) -> usize {
        self.state
            .users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn user(&self, email: &str) -> Option<User> {
        self.state
            .users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(email)
            .cloned()
    }
}

pub async fn run(addr: SocketAddr, config: MockConfig) -> anyhow::Result<()> {
    let app = router(Arc::new(MockState::new(config)));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "Hello World!"
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    email: Option<String>,
    password: Option<String>,
    #[serde(rename = "fullName")]
    full_name: Option<String>,
    roles: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

#[debug_handler]
async fn register(
    State(state): State<Arc<MockState>>,
    Json(body): Json<RegisterBody>,
) -> Reply {
    if let Err(rejected) = state.admit().await {
        return rejected;
    }

    let (email, password) = match credentials(body.email, body.password) {
        Ok(credentials) => credentials,
        Err(rejected) => return rejected,
    };
    let full_name = match body.full_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return reply(StatusCode::BAD_REQUEST, "fullName must not be empty"),
    };

    let mut users = state.users.write().unwrap_or_else(PoisonError::into_inner);
    if users.contains_key(&email) {
        return reply(
            StatusCode::CONFLICT,
            &format!("Key (email)=({email}) already exists."),
        );
    }

    let user = User {
        id: format!("user-{}", users.len() + 1),
        email: email.clone(),
        password,
        full_name,
        is_active: true,
        roles: body.roles.unwrap_or_else(|| "user".to_string()),
    };
    let response = json!({
        "id": user.id,
        "email": user.email,
        "fullName": user.full_name,
        "isActive": user.is_active,
        "roles": user.roles,
    });
    users.insert(email, user);

    (StatusCode::CREATED, Json(response))
}

#[debug_handler]
async fn login(State(state): State<Arc<MockState>>, Json(body): Json<LoginBody>) -> Reply {
    if let Err(rejected) = state.admit().await {
        return rejected;
    }

    let (email, password) = match credentials(body.email, body.password) {
        Ok(credentials) => credentials,
        Err(rejected) => return rejected,
    };

    let user = state
        .users
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&email)
        .cloned();

    match user {
        Some(user) if user.is_active && user.password == password => {
            let mut response = json!({ "id": user.id, "email": user.email });
            if !state.config.omit_token {
                let n = state.issued.fetch_add(1, Ordering::Relaxed);
                response["token"] = json!(format!("mock-token-{n}"));
            }
            (StatusCode::CREATED, Json(response))
        }
        _ => reply(StatusCode::UNAUTHORIZED, "Credentials are not valid"),
    }
}

fn credentials(email: Option<String>, password: Option<String>) -> Result<(String, String), Reply> {
    let email = match email {
        Some(email) if is_email(&email) => email,
        _ => return Err(reply(StatusCode::BAD_REQUEST, "email must be an email")),
    };
    let password = match password {
        Some(password) if password.len() >= MIN_PASSWORD_LEN => password,
        _ => {
            return Err(reply(
                StatusCode::BAD_REQUEST,
                "password must be longer than or equal to 6 characters",
            ))
        }
    };
    Ok((email, password))
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
