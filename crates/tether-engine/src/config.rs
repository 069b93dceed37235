use crate::EngineError;

/// Default broker address.
pub const DEFAULT_SERVER: &str = "ws.tether.dev";

fn uuid_shaped(s: &str) -> bool {
    s.len() == 36
        && s.bytes().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

/// Socket authentication token, a UUID-shaped credential.
#[derive(Clone, Debug)]
pub struct AppKey(String);

impl AppKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn is_valid(&self) -> bool {
        uuid_shaped(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Message signing key: two UUID-shaped halves joined by a dash.
///
/// Deliberately no `Display`; the secret stays out of log output.
#[derive(Clone)]
pub struct AppSecret(String);

impl AppSecret {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn is_valid(&self) -> bool {
        self.0.len() == 73
            && self.0.as_bytes()[36] == b'-'
            && uuid_shaped(&self.0[..36])
            && uuid_shaped(&self.0[37..])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AppSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AppSecret(****)")
    }
}

/// Engine credentials and broker address.
#[derive(Clone, Debug)]
pub struct Config {
    pub app_key: AppKey,
    pub app_secret: AppSecret,
    pub server: String,
}

impl Config {
    pub fn new(app_key: &str, app_secret: &str, server: &str) -> Self {
        Self {
            app_key: AppKey::new(app_key),
            app_secret: AppSecret::new(app_secret),
            server: server.to_string(),
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.app_key.is_valid() {
            return Err(EngineError::InvalidAppKey);
        }
        if !self.app_secret.is_valid() {
            return Err(EngineError::InvalidAppSecret);
        }
        Ok(())
    }
}
