use crate::LanguageModelError;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

/// Create a JSON request, parse the response.
/// Returns `LanguageModelError::StatusCode` for any non-2xx status code,
/// carrying the (possibly truncated) response body.
pub async fn send_json<T: Serialize, R: DeserializeOwned>(
    client: &Client,
    url: &str,
    data: &T,
    headers: reqwest::header::HeaderMap,
) -> Result<R, LanguageModelError> {
    let response = client.post(url).headers(headers).json(data).send().await?;
    let status = response.status();
    if status.is_success() {
        Ok(response.json::<R>().await?)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(LanguageModelError::StatusCode(
            status,
            truncate_body(&body, MAX_ERROR_BODY_CHARS),
        ))
    }
}

const MAX_ERROR_BODY_CHARS: usize = 500;

fn truncate_body(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_body;

    #[test]
    fn truncate_body_respects_char_boundaries() {
        assert_eq!(truncate_body("héllo", 2), "hé");
        assert_eq!(truncate_body("short", 500), "short");
    }
}
