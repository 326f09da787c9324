//! Backend implementations for the supported model providers

mod anthropic;
mod openai;
mod watsonx;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use watsonx::WatsonxProvider;

use super::ProviderError;

/// Map an HTTP status and response body into a provider error
pub(crate) fn map_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited,
        401 | 403 => ProviderError::Auth(truncate(body)),
        // Transient server-side failures are retried like timeouts.
        408 | 500..=599 => ProviderError::Timeout,
        _ => ProviderError::Fatal(format!("{}: {}", status, truncate(body))),
    }
}

/// Map a transport-level failure into a provider error
pub(crate) fn map_transport(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() {
        ProviderError::Timeout
    } else {
        ProviderError::Fatal(err.to_string())
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= 200 {
        return body.to_string();
    }
    // Back up to a char boundary; bodies are not guaranteed ASCII.
    let mut cut = 200;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} chars)", &body[..cut], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ProviderError::RateLimited
        );
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "bad key"),
            ProviderError::Auth(_)
        ));
        assert_eq!(
            map_status(StatusCode::BAD_GATEWAY, ""),
            ProviderError::Timeout
        );
        assert!(matches!(
            map_status(StatusCode::UNPROCESSABLE_ENTITY, "bad model"),
            ProviderError::Fatal(_)
        ));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(500);
        let truncated = truncate(&body);
        assert!(truncated.len() < 250);
        assert!(truncated.contains("500 chars"));
    }

    #[test]
    fn test_truncate_multibyte_body() {
        // 301 bytes; byte 200 lands inside a two-byte character.
        let body = format!("x{}", "é".repeat(150));
        let truncated = truncate(&body);
        assert!(truncated.contains("301 chars"));
        assert!(!truncated.contains('\u{fffd}'));

        let err = map_status(StatusCode::UNPROCESSABLE_ENTITY, &body);
        assert!(matches!(err, ProviderError::Fatal(_)));
    }
}
