//! Process configuration, read once at cold start

use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::error::NotifyError;
use crate::pricing::FeeSchedule;

const DEFAULT_SOURCE: &str = "no-reply@spacenow.com";
const DEFAULT_CONFIGURATION_SET: &str = "Emails";
const DEFAULT_REFERRAL_EMAIL: &str = "team@spacenow.com";
const DEFAULT_SMS_SENDER: &str = "Spacenow";
const DEFAULT_TIMEZONE: &str = "Australia/Sydney";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub email_source: String,
    pub reply_to: String,
    pub bcc_emails: Vec<String>,
    pub configuration_set: String,
    pub app_link: String,
    pub booking_api_url: String,
    pub sms_endpoint: Option<String>,
    pub sms_sender_name: String,
    pub referral_email: String,
    pub display_timezone: Tz,
    pub fees: FeeSchedule,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup; blank values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, NotifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                NotifyError::Config(format!("{} environment variable not set", key))
            })
        };

        let email_source = get("EMAIL_SOURCE").unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let reply_to = get("EMAIL_REPLY_TO").unwrap_or_else(|| email_source.clone());

        let bcc_emails = get("BCC_EMAILS")
            .or_else(|| get("BBC_EMAILS"))
            .map(|list| list.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let timezone_name = get("DISPLAY_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let display_timezone: Tz = timezone_name.parse().map_err(|_| {
            NotifyError::Config(format!("DISPLAY_TIMEZONE '{}' is not a known timezone", timezone_name))
        })?;

        let defaults = FeeSchedule::default();
        let fees = FeeSchedule {
            guest_rate: parse_rate(get("GUEST_FEE_RATE"), "GUEST_FEE_RATE")?.unwrap_or(defaults.guest_rate),
            host_rate: parse_rate(get("HOST_FEE_RATE"), "HOST_FEE_RATE")?.unwrap_or(defaults.host_rate),
        };

        Ok(Self {
            email_source,
            reply_to,
            bcc_emails,
            configuration_set: get("SES_CONFIGURATION_SET")
                .unwrap_or_else(|| DEFAULT_CONFIGURATION_SET.to_string()),
            app_link: required("NEW_LISTING_PROCESS_HOST")?,
            booking_api_url: required("API_BOOKING")?.trim_end_matches('/').to_string(),
            sms_endpoint: get("SMS_ENDPOINT"),
            sms_sender_name: get("SMS_SENDER_NAME").unwrap_or_else(|| DEFAULT_SMS_SENDER.to_string()),
            referral_email: get("REFERRAL_EMAIL").unwrap_or_else(|| DEFAULT_REFERRAL_EMAIL.to_string()),
            display_timezone,
            fees,
            cors_origin: get("DOMAIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}

fn parse_rate(value: Option<String>, key: &str) -> Result<Option<Decimal>, NotifyError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let rate: Decimal = raw
        .parse()
        .map_err(|_| NotifyError::Config(format!("{} '{}' is not a decimal", key, raw)))?;
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(NotifyError::Config(format!("{} must be between 0 and 1, got {}", key, rate)));
    }
    Ok(Some(rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("NEW_LISTING_PROCESS_HOST", "https://app.example.com"),
        ("API_BOOKING", "https://api.example.com/bookings/"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&REQUIRED)).unwrap();
        assert_eq!(config.email_source, DEFAULT_SOURCE);
        assert_eq!(config.reply_to, DEFAULT_SOURCE);
        assert!(config.bcc_emails.is_empty());
        assert_eq!(config.configuration_set, "Emails");
        assert_eq!(config.booking_api_url, "https://api.example.com/bookings");
        assert_eq!(config.display_timezone, Tz::Australia__Sydney);
        assert_eq!(config.fees, FeeSchedule::default());
        assert_eq!(config.sms_endpoint, None);
        assert_eq!(config.cors_origin, "*");
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_vars(vars(&[("API_BOOKING", "https://api.example.com")])).unwrap_err();
        assert!(err.to_string().contains("NEW_LISTING_PROCESS_HOST"));
    }

    #[test]
    fn test_bcc_list_and_legacy_name() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BBC_EMAILS", "ops@example.com  team@example.com"));
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.bcc_emails, vec!["ops@example.com", "team@example.com"]);

        pairs.push(("BCC_EMAILS", "only@example.com"));
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.bcc_emails, vec!["only@example.com"]);
    }

    #[test]
    fn test_fee_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HOST_FEE_RATE", "0.135"));
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.fees.host_rate, dec!(0.135));
        assert_eq!(config.fees.guest_rate, dec!(0.035));

        pairs.push(("GUEST_FEE_RATE", "1.5"));
        assert!(Config::from_vars(vars(&pairs)).is_err());
    }

    #[test]
    fn test_bad_timezone() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DISPLAY_TIMEZONE", "Mars/Olympus"));
        assert!(Config::from_vars(vars(&pairs)).is_err());
    }
}
