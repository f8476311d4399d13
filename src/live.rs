//! Optional online translation used to fill gaps in the translation table.

use crate::error::{Error, Result};

pub trait LiveTranslator {
    /// Translates English `text` into `target` (an ISO 639-1 code).
    fn translate(&self, text: &str, target: &str) -> Result<String>;
}

/// Never reaches the network; every request fails and callers keep the
/// untranslated text.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl LiveTranslator for Offline {
    fn translate(&self, text: &str, target: &str) -> Result<String> {
        Err(Error::Translation(format!(
            "offline, cannot translate '{}' to {}",
            text, target
        )))
    }
}

#[cfg(feature = "live-translate")]
pub use google::GoogleTranslator;

#[cfg(feature = "live-translate")]
mod google {
    use super::LiveTranslator;
    use crate::error::{Error, Result};
    use log::debug;
    use serde_json::Value;
    use std::time::Duration;

    const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

    /// Client for the public Google Translate endpoint.
    pub struct GoogleTranslator {
        client: reqwest::blocking::Client,
        endpoint: String,
    }

    impl GoogleTranslator {
        pub fn new() -> Result<Self> {
            Self::with_endpoint(ENDPOINT)
        }

        pub fn with_endpoint(endpoint: &str) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()?;
            Ok(Self {
                client,
                endpoint: endpoint.to_string(),
            })
        }
    }

    impl LiveTranslator for GoogleTranslator {
        fn translate(&self, text: &str, target: &str) -> Result<String> {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("client", "gtx"),
                    ("sl", "en"),
                    ("tl", target),
                    ("dt", "t"),
                    ("q", text),
                ])
                .send()?
                .error_for_status()?;
            let body: Value = response.json()?;
            debug!("translate '{}' -> {}: {}", text, target, body);
            parse_response(&body)
                .ok_or_else(|| Error::Translation(format!("unexpected response for '{}'", text)))
        }
    }

    // [[["translated", "source", ...], ...], ...]
    pub(super) fn parse_response(body: &Value) -> Option<String> {
        let segments = body.get(0)?.as_array()?;
        let translated: String = segments
            .iter()
            .filter_map(|s| s.get(0).and_then(Value::as_str))
            .collect();
        if translated.trim().is_empty() {
            None
        } else {
            Some(translated)
        }
    }

}
