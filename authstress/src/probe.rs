//! Connectivity diagnosis before a load run
use crate::dispatcher::has_token;
use crate::Target;
use authstress_core::AccountSpec;
use serde_json::{json, Value};
use std::error::Error;
use std::io;
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

const GET_TIMEOUT: Duration = Duration::from_secs(5);
const POST_TIMEOUT: Duration = Duration::from_secs(10);

const DEBUG_EMAIL: &str = "debug@test.com";
const DEBUG_PASSWORD: &str = "DebugTest123!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Responded(u16),
    /// Nothing is listening at the target address.
    ConnectionRefused(String),
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStep {
    pub name: &'static str,
    pub url: String,
    pub status: ProbeStatus,
    /// Only set by the login step when it succeeds.
    pub has_token: Option<bool>,
}

impl ProbeStep {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, ProbeStatus::Responded(status) if (200..300).contains(&status))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub steps: Vec<ProbeStep>,
}

impl ProbeReport {
    /// Whether the service answered at all.
    pub fn reachable(&self) -> bool {
        self.steps
            .first()
            .is_some_and(|step| matches!(step.status, ProbeStatus::Responded(_)))
    }

    /// Whether the debug login succeeded and returned a token.
    pub fn can_authenticate(&self) -> bool {
        self.steps
            .iter()
            .find(|step| step.name == "login")
            .is_some_and(|step| step.succeeded() && step.has_token == Some(true))
    }
}

/// Check, in order: the service root, the base URL, a registration and a login.
///
/// Stops after the first step if the connection is refused, since nothing else can succeed.
#[instrument(name = "probe", skip_all, fields(target = %target.base_url()))]
pub async fn probe(target: &Target) -> ProbeReport {
    let mut steps = vec![];

    let root = get_step(target, "service root", target.root()).await;
    let refused = matches!(root.status, ProbeStatus::ConnectionRefused(_));
    steps.push(root);
    if refused {
        warn!("Nothing is listening at {}", target.root());
        return ProbeReport { steps };
    }

    steps.push(get_step(target, "base url", target.endpoint("")).await);

    let account = AccountSpec::new(DEBUG_EMAIL, DEBUG_PASSWORD, "Debug User");
    let body = serde_json::to_value(&account).unwrap_or(Value::Null);
    steps.push(post_step(target, "register", "/register", &body).await);

    let body = json!({ "email": DEBUG_EMAIL, "password": DEBUG_PASSWORD });
    steps.push(post_step(target, "login", "/login", &body).await);

    ProbeReport { steps }
}

async fn get_step(target: &Target, name: &'static str, url: String) -> ProbeStep {
    let res = target.client().get(&url).timeout(GET_TIMEOUT).send().await;
    let status = match res {
        Ok(response) => ProbeStatus::Responded(response.status().as_u16()),
        Err(err) => transport_status(err),
    };
    debug!("{name}: {status:?}");

    ProbeStep {
        name,
        url,
        status,
        has_token: None,
    }
}

async fn post_step(target: &Target, name: &'static str, path: &str, body: &Value) -> ProbeStep {
    let url = target.endpoint(path);
    let res = target
        .client()
        .post(&url)
        .json(body)
        .timeout(POST_TIMEOUT)
        .send()
        .await;

    let (status, has_token) = match res {
        Ok(response) => {
            let status = response.status();
            let body = response.json::<Value>().await.ok();
            let has_token = (status.is_success() && name == "login")
                .then(|| body.as_ref().is_some_and(has_token));
            if !status.is_success() {
                debug!("{name} rejected with {status}: {body:?}");
            }
            (ProbeStatus::Responded(status.as_u16()), has_token)
        }
        Err(err) => (transport_status(err), None),
    };
    debug!("{name}: {status:?}");

    ProbeStep {
        name,
        url,
        status,
        has_token,
    }
}

fn transport_status(err: reqwest::Error) -> ProbeStatus {
    if is_refused(&err) {
        ProbeStatus::ConnectionRefused(err.to_string())
    } else {
        ProbeStatus::Unreachable(err.to_string())
    }
}

/// Whether the connection was actively refused. DNS and TLS failures are connect errors too, but
/// say nothing about whether a service is listening.
fn is_refused(err: &(dyn Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<io::Error>() {
            if io.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = err.source();
    }
    false
}
