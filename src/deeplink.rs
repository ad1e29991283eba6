//! Deep-link handling for OAuth callbacks.
//!
//! The external sign-in flow redirects back into the app through the
//! registered `parapluie://` scheme; the only path the flow cares about is
//! the auth callback.

/// Registered URL scheme.
pub const APP_SCHEME: &str = "parapluie";

/// Path segment marking an OAuth callback.
const AUTH_CALLBACK_PATH: &str = "auth/callback";

/// Redirect target passed to the OAuth provider.
#[must_use]
pub fn oauth_redirect_url() -> String {
    format!("{APP_SCHEME}://{AUTH_CALLBACK_PATH}")
}

/// Whether an incoming URL is an auth callback.
///
/// Matches both the custom scheme and universal-link forms.
#[must_use]
pub fn is_auth_callback(url: &str) -> bool {
    url.contains(AUTH_CALLBACK_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_scheme_callback_matches() {
        assert!(is_auth_callback("parapluie://auth/callback#access_token=x"));
    }

    #[test]
    fn universal_link_callback_matches() {
        assert!(is_auth_callback("https://parapluie.app/auth/callback?code=y"));
    }

    #[test]
    fn unrelated_urls_do_not_match() {
        assert!(!is_auth_callback("parapluie://home"));
        assert!(!is_auth_callback("https://example.com/"));
    }

    #[test]
    fn redirect_url_uses_app_scheme() {
        assert_eq!(oauth_redirect_url(), "parapluie://auth/callback");
    }
}
