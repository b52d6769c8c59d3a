//! Authentication extractors.
//!
//! Sign-in is handled by a separate service that writes the user identity
//! into the shared session store. The storefront only reads it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Build the login URL that returns the shopper to `next` afterwards.
#[must_use]
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{separator}{query}")
}

/// Extractor that optionally gets the current user.
///
/// Does not reject the request if nobody is signed in; checkout decides
/// where to send anonymous shoppers.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_appends_next() {
        assert_eq!(
            login_redirect("/auth/login", "/checkout"),
            "/auth/login?next=%2Fcheckout"
        );
    }

    #[test]
    fn test_login_redirect_extends_existing_query() {
        assert_eq!(
            login_redirect("https://accounts.katale.ug/login?app=shop", "/checkout/place-order"),
            "https://accounts.katale.ug/login?app=shop&next=%2Fcheckout%2Fplace-order"
        );
    }
}
