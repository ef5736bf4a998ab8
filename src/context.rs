//! Clients and configuration shared by every invocation of a warm Lambda

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_sesv2::Client as SesClient;

use crate::booking_api::BookingApi;
use crate::config::Config;
use crate::error::NotifyError;
use crate::mailer::Mailer;
use crate::sms::SmsSender;

pub struct AppContext {
    pub config: Config,
    pub dynamodb: DynamoDbClient,
    pub mailer: Mailer,
    pub bookings: BookingApi,
    pub sms: SmsSender,
}

impl AppContext {
    /// Built once at cold start and borrowed by the handler for every event.
    pub async fn load() -> Result<Self, NotifyError> {
        let config = Config::from_env()?;
        let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let http = reqwest::Client::new();

        Ok(Self {
            dynamodb: DynamoDbClient::new(&aws),
            mailer: Mailer::new(SesClient::new(&aws), &config),
            bookings: BookingApi::new(http.clone(), &config.booking_api_url),
            sms: SmsSender::new(http, config.sms_endpoint.clone(), &config.sms_sender_name),
            config,
        })
    }
}
