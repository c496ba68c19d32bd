use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

/// Settings for the paginated delivery system API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpstreamConfig {
    /// Base url, collections are requested as `{api_url}/{collection}`.
    pub api_url: String,
    /// Sent as the `X-Nickname` header.
    pub nickname: String,
    /// Sent as the `X-Cohort` header.
    pub cohort: String,
    /// Sent as the `X-API-KEY` header.
    pub api_key: SecretString,
    /// Size of the trailing time window requested from the API.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Documents requested per page, also the offset increment.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_window_days() -> u32 {
    7
}

fn default_page_size() -> usize {
    50
}

fn default_request_timeout_secs() -> u64 {
    20
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page_size == 0 {
            return Err(ValidationError::PageSizeZero);
        }

        if self.window_days == 0 {
            return Err(ValidationError::WindowDaysZero);
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ValidationError::InvalidApiUrl(self.api_url.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> UpstreamConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn defaults_follow_api_pagination() {
        let config = parse(
            r#"{"api_url":"https://api.example.com","nickname":"n","cohort":"1","api_key":"k"}"#,
        );

        assert_eq!(config.window_days, 7);
        assert_eq!(config.page_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let config = parse(
            r#"{"api_url":"https://api.example.com","nickname":"n","cohort":"1","api_key":"k","page_size":0}"#,
        );

        assert!(matches!(config.validate(), Err(ValidationError::PageSizeZero)));
    }

    #[test]
    fn relative_api_url_is_rejected() {
        let config =
            parse(r#"{"api_url":"api.example.com","nickname":"n","cohort":"1","api_key":"k"}"#);

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidApiUrl(_))
        ));
    }
}
