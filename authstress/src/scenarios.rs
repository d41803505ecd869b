//! The built-in authentication scenarios
use authstress_core::{AccountSpec, PayloadBuilder, ScenarioConfig, Threshold};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const TEST_PASSWORD: &str = "TestPass123!";
pub const LOGIN_ACCOUNT_EMAIL: &str = "logintest@test.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScenarioKind {
    Register,
    Login,
    LoginInvalidCredentials,
    LoginMalformed,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Register,
        ScenarioKind::Login,
        ScenarioKind::LoginInvalidCredentials,
        ScenarioKind::LoginMalformed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Register => "register",
            ScenarioKind::Login => "login",
            ScenarioKind::LoginInvalidCredentials => "login-invalid-credentials",
            ScenarioKind::LoginMalformed => "login-malformed",
        }
    }

    pub fn config(&self) -> ScenarioConfig {
        match self {
            ScenarioKind::Register => register(),
            ScenarioKind::Login => login(),
            ScenarioKind::LoginInvalidCredentials => login_invalid_credentials(),
            ScenarioKind::LoginMalformed => login_malformed(),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = ScenarioKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown scenario `{s}`, expected one of: {}", names.join(", "))
            })
    }
}

/// Flood `/register` with unique accounts.
///
/// Emails are `testuser{index}_{unix_millis}@test.com`, so neither two slots nor two runs collide.
pub fn register() -> ScenarioConfig {
    let payload = PayloadBuilder::new(|index| {
        let timestamp = unix_millis()?;
        Ok(json!({
            "email": format!("testuser{index}_{timestamp}@test.com"),
            "password": TEST_PASSWORD,
            "fullName": format!("Test User {index}"),
            "roles": "user",
        }))
    });

    let mut config = ScenarioConfig::new(ScenarioKind::Register.name(), "/register", payload);
    config.inter_request_delay = Duration::from_millis(10);
    config.threshold = Threshold::AtLeast(60.);
    config.wall_clock_ceiling = Duration::from_secs(45);
    config
}

/// Flood `/login` with the credentials of a fixed account, registered beforehand.
pub fn login() -> ScenarioConfig {
    let payload = PayloadBuilder::fixed(json!({
        "email": LOGIN_ACCOUNT_EMAIL,
        "password": TEST_PASSWORD,
    }));

    let mut config = ScenarioConfig::new(ScenarioKind::Login.name(), "/login", payload);
    config.inter_request_delay = Duration::from_millis(5);
    config.threshold = Threshold::AtLeast(80.);
    config.wall_clock_ceiling = Duration::from_secs(30);
    config.expect_token = true;
    config.precondition = Some(AccountSpec::new(
        LOGIN_ACCOUNT_EMAIL,
        TEST_PASSWORD,
        "Login Test User",
    ));
    config
}

/// Log in as an account that does not exist. Every request must be rejected.
pub fn login_invalid_credentials() -> ScenarioConfig {
    let payload = PayloadBuilder::fixed(json!({
        "email": "nonexistent@test.com",
        "password": "WrongPassword123!",
    }));

    let mut config = ScenarioConfig::new(
        ScenarioKind::LoginInvalidCredentials.name(),
        "/login",
        payload,
    );
    config.threshold = Threshold::ExactlyZero;
    config.wall_clock_ceiling = Duration::from_secs(15);
    config
}

/// Log in with an invalid email and a too-short password. Every request must be rejected.
pub fn login_malformed() -> ScenarioConfig {
    let payload = PayloadBuilder::fixed(json!({
        "email": "invalid-email",
        "password": "123",
    }));

    let mut config = ScenarioConfig::new(ScenarioKind::LoginMalformed.name(), "/login", payload);
    config.threshold = Threshold::ExactlyZero;
    config.wall_clock_ceiling = Duration::from_secs(10);
    config
}

fn unix_millis() -> Result<u128, String> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_millis())
        .map_err(|err| format!("system clock is before the unix epoch: {err}"))
}
