use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Checks a shared key sent as `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub struct ApiKeyAuthenticator {
    key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn presented_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        let bearer = request.headers.get("authorization").and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        });
        bearer.or_else(|| request.headers.get("x-api-key").map(String::as_str))
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let presented = self
            .presented_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        if !keys_match(presented.as_bytes(), self.key.as_bytes()) {
            return Err(AuthError::InvalidCredentials("Invalid API key".to_string()));
        }

        Ok(Identity {
            user_id: "api_key".to_string(),
            method: self.method_name().to_string(),
        })
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Compare without short-circuiting on the first differing byte.
fn keys_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn request(headers: &[(&str, &str)]) -> AuthRequest {
        AuthRequest {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            source_ip: IpAddr::from([127, 0, 0, 1]),
        }
    }

    #[tokio::test]
    async fn test_accepts_bearer_and_x_api_key() {
        let auth = ApiKeyAuthenticator::new("librarian");

        for headers in [
            [("Authorization", "Bearer librarian")],
            [("Authorization", "bearer librarian")],
            [("X-API-Key", "librarian")],
        ] {
            let identity = auth.authenticate(&request(&headers)).await.unwrap();
            assert_eq!(identity.method, "api_key");
        }
    }

    #[tokio::test]
    async fn test_wrong_key_is_invalid() {
        let auth = ApiKeyAuthenticator::new("librarian");

        let result = auth
            .authenticate(&request(&[("Authorization", "Bearer visitor")]))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));

        let result = auth
            .authenticate(&request(&[("X-API-Key", "librarian2")]))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_authenticated() {
        let auth = ApiKeyAuthenticator::new("librarian");

        let result = auth.authenticate(&request(&[])).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));

        // Basic credentials are not an API key
        let result = auth
            .authenticate(&request(&[("Authorization", "Basic bGlicmFyaWFu")]))
            .await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match(b"librarian", b"librarian"));
        assert!(!keys_match(b"librarian", b"librarians"));
        assert!(!keys_match(b"librarian", b"Librarian"));
        assert!(keys_match(b"", b""));
    }
}
