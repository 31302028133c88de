//! One-shot user notices carried across a redirect in a cookie.

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }
}

/// Reads pending flashes from the request cookies.
///
/// A missing or undecodable cookie yields no messages.
pub fn read(headers: &HeaderMap, cookie_name: &str) -> Vec<FlashMessage> {
    let Some(raw) = find_cookie(headers, cookie_name) else {
        return Vec::new();
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(raw.as_bytes())
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Vec<FlashMessage>>(&bytes).ok());

    match decoded {
        Some(messages) => messages,
        None => {
            warn!(cookie = cookie_name, "Discarding malformed flash cookie");
            Vec::new()
        }
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// `Set-Cookie` value storing `messages`.
pub fn set_cookie(cookie_name: &str, messages: &[FlashMessage]) -> Option<HeaderValue> {
    let payload = serde_json::to_vec(messages).ok()?;
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    HeaderValue::from_str(&format!(
        "{cookie_name}={encoded}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

/// `Set-Cookie` value expiring the flash cookie.
pub fn clear_cookie(cookie_name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{cookie_name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
    .ok()
}

/// A 303 redirect that queues flash messages for the next page view.
#[derive(Debug)]
pub struct FlashRedirect {
    to: String,
    cookie_name: String,
    messages: Vec<FlashMessage>,
}

impl FlashRedirect {
    pub fn new(to: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            cookie_name: cookie_name.into(),
            messages: Vec::new(),
        }
    }

    pub fn with(mut self, message: FlashMessage) -> Self {
        self.messages.push(message);
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let mut response = Redirect::to(&self.to).into_response();
        if !self.messages.is_empty() {
            if let Some(value) = set_cookie(&self.cookie_name, &self.messages) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn cookie_header(value: HeaderValue) -> HeaderMap {
        let pair = value.to_str().unwrap().split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; {pair}")).unwrap(),
        );
        headers
    }

    #[test]
    fn flashes_survive_the_cookie() {
        let messages = vec![
            FlashMessage::warning("No batches with stock available for this cookie."),
            FlashMessage::success("ok"),
        ];
        let headers = cookie_header(set_cookie("flash", &messages).unwrap());
        assert_eq!(read(&headers, "flash"), messages);
    }

    #[test]
    fn garbage_cookie_reads_as_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("flash=%%%"));
        assert!(read(&headers, "flash").is_empty());
        assert!(read(&HeaderMap::new(), "flash").is_empty());
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let value = clear_cookie("flash").unwrap();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn redirect_sets_cookie_only_when_messages_are_queued() {
        let silent = FlashRedirect::new("/galletas", "flash").into_response();
        assert_eq!(silent.status(), StatusCode::SEE_OTHER);
        assert!(silent.headers().get(header::SET_COOKIE).is_none());

        let noisy = FlashRedirect::new("/galletas", "flash")
            .with(FlashMessage::danger("boom"))
            .into_response();
        assert_eq!(noisy.headers()[header::LOCATION], "/galletas");
        assert!(noisy.headers().get(header::SET_COOKIE).is_some());
    }
}
