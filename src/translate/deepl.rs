//! DeepL-style commercial translation client: form-encoded POST keyed by a
//! subscription credential, uppercase language codes, JSON response.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ProviderError, TranslationProvider};

pub const PROVIDER_NAME: &str = "deepl";

/// Conservative request limit; the API accepts more but long requests stall
/// the flow display.
const MAX_TEXT_LEN: usize = 5000;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub struct DeepLProvider {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl DeepLProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key,
            api_url,
        }
    }

    fn classify_status(status: u16, body: String) -> ProviderError {
        match status {
            401 | 403 => ProviderError::Auth {
                provider: PROVIDER_NAME,
                message: body,
            },
            // 456 is DeepL's character-quota code.
            429 | 456 => ProviderError::QuotaExhausted {
                provider: PROVIDER_NAME,
                message: body,
            },
            _ => ProviderError::Http {
                provider: PROVIDER_NAME,
                status,
                message: body,
            },
        }
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn max_text_len(&self) -> Option<usize> {
        Some(MAX_TEXT_LEN)
    }

    async fn translate_raw(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ProviderError> {
        let source = source_lang.to_uppercase();
        let target = target_lang.to_uppercase();
        let params = [
            ("auth_key", self.api_key.as_str()),
            ("text", text),
            ("source_lang", source.as_str()),
            ("target_lang", target.as_str()),
        ];

        debug!(chars = text.chars().count(), "deepl request");

        let response = self
            .http
            .post(&self.api_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: PROVIDER_NAME,
                    }
                } else {
                    ProviderError::Transport {
                        provider: PROVIDER_NAME,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ProviderError::Transport {
            provider: PROVIDER_NAME,
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            let snippet: String = body.chars().take(200).collect();
            return Err(Self::classify_status(status, snippet));
        }

        let parsed: TranslateResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_NAME,
                message: e.to_string(),
            })?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(ProviderError::Malformed {
                provider: PROVIDER_NAME,
                message: "no translation returned".to_string(),
            })
    }
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}
