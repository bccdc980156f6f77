use secrecy::ExposeSecret;

use crate::client::config::Config;
use crate::client::consts::{PREVIEW_PATH, STABLE_PATH};
use crate::types::ApiSurface;

/// `host` with any `scheme://` prefix and trailing slashes removed.
pub fn normalize_host(host: &str) -> &str {
    let host = host.trim();
    let host = match host.find("://") {
        Some(index) => &host[index + 3..],
        None => host,
    };
    host.trim_end_matches('/')
}

pub fn build_url(config: &Config, surface: ApiSurface) -> String {
    let path = match surface {
        ApiSurface::Stable => STABLE_PATH,
        ApiSurface::Preview => PREVIEW_PATH,
    };
    format!(
        "wss://{}/{}?key={}",
        normalize_host(config.host()),
        path,
        urlencoding::encode(config.api_key().expose_secret())
    )
}
