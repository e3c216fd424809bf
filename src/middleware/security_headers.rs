//! Security-related response headers for browser clients.
//!
//! Responsibility:
//! - Clickjacking protection (configurable: an embedded DB console needs framing)
//! - MIME sniffing protection
//! - Referrer leakage control
//! - Browser feature restrictions

use std::str::FromStr;

use axum::Router;
use axum::http::header::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameOptions {
    #[default]
    Deny,
    SameOrigin,
    /// No framing headers at all.
    Disabled,
}

impl FromStr for FrameOptions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "sameorigin" | "same-origin" => Ok(Self::SameOrigin),
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            other => Err(format!("unknown frame options: {other:?}")),
        }
    }
}

/// Apply common security headers to all responses.
pub fn apply<S>(router: Router<S>, frame_options: FrameOptions) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = match frame_options {
        FrameOptions::Deny => router
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("content-security-policy"),
                HeaderValue::from_static("frame-ancestors 'none'"),
            )),
        FrameOptions::SameOrigin => router
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("content-security-policy"),
                HeaderValue::from_static("frame-ancestors 'self'"),
            )),
        FrameOptions::Disabled => router,
    };

    router
        // Prevent MIME sniffing
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ))
}
