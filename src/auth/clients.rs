use serde::Deserialize;
use tracing::{error, warn};

use crate::session::SESSION_ID_HEADER;

/// Identity claims handed back by the session service.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionData {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub session_token: String,
}

/// Client for the external service that trades a one-time session id for the
/// caller's identity.
#[derive(Clone)]
pub struct SessionService {
    http: reqwest::Client,
    url: String,
}

impl SessionService {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    /// `None` whenever the service does not vouch for `session_id`, including
    /// when it can't be reached.
    pub async fn fetch(&self, session_id: &str) -> Option<SessionData> {
        let response = match self.http.get(&self.url).header(SESSION_ID_HEADER, session_id).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("session service unreachable: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("session service rejected session id: {}", response.status());
            return None;
        }

        match response.json::<SessionData>().await {
            Ok(data) => Some(data),
            Err(e) => {
                error!("unreadable session data: {e}");
                None
            }
        }
    }
}
