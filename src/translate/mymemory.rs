//! MyMemory-style free-tier translation client: GET with the text and a
//! `langpair` query parameter, no credential. Used as the fallback backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ProviderError, TranslationProvider};

pub const PROVIDER_NAME: &str = "mymemory";

/// Free tier rejects queries beyond 500 bytes.
const MAX_TEXT_LEN: usize = 500;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub struct MyMemoryProvider {
    http: reqwest::Client,
    api_url: String,
}

impl MyMemoryProvider {
    pub fn new(api_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, api_url }
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
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
        let langpair = format!(
            "{}|{}",
            source_lang.to_lowercase(),
            target_lang.to_lowercase()
        );

        debug!(chars = text.chars().count(), langpair = %langpair, "mymemory request");

        let response = self
            .http
            .get(&self.api_url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
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

        if status == 429 {
            return Err(ProviderError::QuotaExhausted {
                provider: PROVIDER_NAME,
                message: body.chars().take(200).collect(),
            });
        }
        if !(200..300).contains(&status) {
            return Err(ProviderError::Http {
                provider: PROVIDER_NAME,
                status,
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: QueryResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_NAME,
                message: e.to_string(),
            })?;

        // The free tier reports failures in-band with HTTP 200.
        if parsed.response_status != 200 {
            return Err(ProviderError::Http {
                provider: PROVIDER_NAME,
                status: parsed.response_status,
                message: parsed
                    .response_details
                    .unwrap_or_else(|| "translation rejected".to_string()),
            });
        }

        match parsed.response_data {
            Some(data) if !data.translated_text.is_empty() => Ok(data.translated_text),
            _ => Err(ProviderError::Malformed {
                provider: PROVIDER_NAME,
                message: "no translation returned".to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(rename = "responseStatus", deserialize_with = "status_as_u16")]
    response_status: u16,
    #[serde(rename = "responseDetails")]
    response_details: Option<String>,
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
}

#[derive(Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// The API reports status as either a number or a numeric string.
fn status_as_u16<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(|v| v as u16)
            .ok_or_else(|| D::Error::custom("status out of range")),
        serde_json::Value::String(s) => {
            s.parse::<u16>().map_err(|e| D::Error::custom(e.to_string()))
        }
        _ => Err(D::Error::custom("unexpected status type")),
    }
}
