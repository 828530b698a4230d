//! Hosted account-management page URL

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::types::{AccountPageUrlOptions, AuthConfig, RedirectUriType};

/// Build `{auth_url}/account`, optionally with an `rt` redirect hint
///
/// The hint is the standard (padded, non URL-safe) base64 of the redirect
/// URI, form-urlencoded into the query string.
///
/// ```
/// use tokenflow_common::auth::{account_page_url, AccountPageUrlOptions, AuthConfig};
///
/// let config = AuthConfig::for_auth_url("client", "https://auth.example.com", "minimalauth://");
/// assert_eq!(
///     account_page_url(&config, &AccountPageUrlOptions::default_redirect()),
///     "https://auth.example.com/account?rt=bWluaW1hbGF1dGg6Ly8%3D"
/// );
/// ```
#[must_use]
pub fn account_page_url(config: &AuthConfig, options: &AccountPageUrlOptions) -> String {
    let base = config.account_url();

    let redirect = match options.redirect_uri_type {
        RedirectUriType::Custom => options.redirect_uri.as_deref(),
        RedirectUriType::Default => Some(config.redirect_uri.as_str()),
        RedirectUriType::None => None,
    };

    match redirect {
        Some(uri) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("rt", &STANDARD.encode(uri.as_bytes()))
                .finish();
            format!("{base}?{query}")
        }
        None => base,
    }
}
