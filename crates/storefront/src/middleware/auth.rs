//! Authentication extractors.
//!
//! Sign-in is handled by the hosted identity provider in front of the
//! storefront. It forwards the authenticated user as request headers, which
//! these extractors turn into a [`CurrentUser`].

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use ezcentials_core::UserId;

use crate::models::CurrentUser;

/// Header carrying the identity provider's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the user's display name (UTF-8).
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Extractor that optionally gets the signed-in user.
///
/// Never rejects; handlers decide what an anonymous visitor may do.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalUser(user): OptionalUser) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.review_name()),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts)))
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let id = header_str(parts, USER_ID_HEADER)?;
    Some(CurrentUser {
        id: UserId::new(id),
        display_name: header_str(parts, USER_NAME_HEADER).map(String::from),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, Request};

    use super::*;

    fn parts(headers: &[(&str, &[u8])]) -> Parts {
        let mut builder = Request::builder().uri("/products/p-1/reviews");
        for (name, value) in headers {
            builder = builder.header(*name, HeaderValue::from_bytes(value).unwrap());
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_user_from_headers() {
        let mut parts = parts(&[
            (USER_ID_HEADER, b"u-1".as_slice()),
            (USER_NAME_HEADER, "Léa".as_bytes()),
        ]);
        let OptionalUser(user) = OptionalUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        let user = user.unwrap();
        assert_eq!(user.id.as_str(), "u-1");
        assert_eq!(user.display_name.as_deref(), Some("Léa"));
    }

    #[tokio::test]
    async fn test_anonymous_without_user_id() {
        let mut parts = parts(&[
            (USER_NAME_HEADER, b"Marc".as_slice()),
            (USER_ID_HEADER, b"  ".as_slice()),
        ]);
        let OptionalUser(user) = OptionalUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(user.is_none());
    }
}
