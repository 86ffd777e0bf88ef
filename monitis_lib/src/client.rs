//! HTTP client for the Monitis API.

use crate::error::{ApiError, Error};
use crate::monitor::{
    AuthTokenOutput, EditExternalMonitorOptions, EditExternalMonitorOutput,
    EDIT_EXTERNAL_MONITOR_ACTION,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

const API_BASE: &str = "http://www.monitis.com/api";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Credentials sent with every authenticated action.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth {
    pub api_key: String,
    pub auth_token: String,
}

impl Auth {
    pub fn new(api_key: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            auth_token: auth_token.into(),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("api_key", &"<redacted>")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Monitis API client.
///
/// Each call sends exactly one request; nothing is retried.
#[derive(Clone)]
pub struct Client {
    api_base: String,
    http: HttpClient,
}

impl Client {
    /// Create a client for the public API endpoint.
    pub fn new() -> Result<Self, Error> {
        let user_agent = format!("monitis-cli/{}", crate::VERSION);
        let http = HttpClient::builder()
            .user_agent(user_agent)
            .build()
            .map_err(Error::Request)?;
        Ok(Self {
            api_base: API_BASE.to_string(),
            http,
        })
    }

    /// Send requests to `api_base` instead of the public endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Exchange an API key and secret key for an auth token.
    pub async fn get_auth_token(&self, api_key: &str, secret_key: &str) -> Result<Auth, Error> {
        let url = format!(
            "{}?action=authToken&apikey={}&secretkey={}",
            self.api_base,
            urlencoding::encode(api_key),
            urlencoding::encode(secret_key)
        );
        let req = self.http.get(&url).build().map_err(Error::Request)?;
        debug!("requesting auth token");
        let output: AuthTokenOutput = self.send(req).await?;
        if let Some(message) = output.error.filter(|e| !e.is_empty()) {
            return Err(Error::Api(ApiError::new(message, None)));
        }
        let token = output
            .auth_token
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingField("authToken"))?;
        Ok(Auth::new(api_key, token))
    }

    /// Update an existing external monitor. Only the fields set in `opts` are sent.
    pub async fn edit_external_monitor(
        &self,
        auth: &Auth,
        test_id: &str,
        opts: &EditExternalMonitorOptions,
    ) -> Result<(), Error> {
        let params = opts.to_form();
        let body = edit_external_monitor_form(auth, test_id, &params);
        let req = self
            .http
            .post(&self.api_base)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .build()
            .map_err(Error::Request)?;
        debug!(
            test_id,
            params = params.len(),
            "sending {}",
            EDIT_EXTERNAL_MONITOR_ACTION
        );
        let output: EditExternalMonitorOutput = self.send(req).await?;
        output.into_result()
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::Request) -> Result<T, Error> {
        let res = self.http.execute(req).await.map_err(Error::Transport)?;
        let status = res.status();
        let body = res.text().await.map_err(Error::Read)?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        serde_json::from_str(&body).map_err(|source| Error::Decode { body, source })
    }
}

/// URL-encoded body of an edit request: `params` (from
/// [`EditExternalMonitorOptions::to_form`]) followed by `action`, `testId`,
/// `apikey` and `authToken`.
pub fn edit_external_monitor_form(
    auth: &Auth,
    test_id: &str,
    params: &[(&'static str, String)],
) -> String {
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        form.append_pair(name, value);
    }
    form.append_pair("action", EDIT_EXTERNAL_MONITOR_ACTION);
    form.append_pair("testId", test_id);
    form.append_pair("apikey", &auth.api_key);
    form.append_pair("authToken", &auth.auth_token);
    form.finish()
}
