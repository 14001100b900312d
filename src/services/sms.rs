//! SMS dispatcher. Gated by the `enable_sms` flag; missing credentials make
//! every send report failure without erroring, so callers never need to
//! special-case an unconfigured provider.

use crate::config::AppConfig;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Contract the notification fan-out depends on. Returns plain success or
/// failure; an SMS can never raise into the settlement workflow.
#[async_trait]
pub trait SmsDispatcher: Send + Sync {
    async fn send(&self, to_phone: &str, message: &str) -> bool;
}

/// Twilio REST client.
pub struct TwilioSms {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
}

impl TwilioSms {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: TWILIO_API_BASE.to_string(),
            enabled: config.enable_sms,
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
        }
    }
}

#[async_trait]
impl SmsDispatcher for TwilioSms {
    #[instrument(skip(self, message), fields(to = %to_phone))]
    async fn send(&self, to_phone: &str, message: &str) -> bool {
        if !self.enabled {
            debug!("enable_sms is false; not sending SMS");
            return false;
        }

        let (Some(sid), Some(token), Some(from)) = (
            self.account_sid.as_deref(),
            self.auth_token.as_deref(),
            self.from_number.as_deref(),
        ) else {
            error!("Twilio credentials missing in configuration; cannot send SMS");
            return false;
        };

        let result = self
            .client
            .post(format!("{}/Accounts/{}/Messages.json", self.base_url, sid))
            .basic_auth(sid, Some(token))
            .form(&[("To", to_phone), ("From", from), ("Body", message)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Twilio SMS sent");
                true
            }
            Ok(response) => {
                warn!("Twilio SMS rejected with status {}", response.status());
                false
            }
            Err(e) => {
                error!("Twilio SMS request failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "test_secret_key_for_testing_purposes_only_32chars".into(),
            3600,
            "127.0.0.1".into(),
            8080,
            "test".into(),
        )
    }

    #[tokio::test]
    async fn disabled_sms_reports_failure_without_network() {
        let sms = TwilioSms::new(&base_config());
        assert!(!sms.send("+919876543210", "hello").await);
    }

    #[tokio::test]
    async fn missing_credentials_report_failure_without_network() {
        let mut cfg = base_config();
        cfg.enable_sms = true;
        let sms = TwilioSms::new(&cfg);
        assert!(!sms.send("+919876543210", "hello").await);
    }
}
