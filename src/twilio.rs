//! Minimal Twilio REST client
//!
//! Only what the `update-webhook` tool needs: find an incoming phone number
//! and point its Voice webhook at this service.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// HTTP method the gateway uses to call the webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum WebhookMethod {
    Post,
    Get,
}

impl WebhookMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookMethod::Post => "POST",
            WebhookMethod::Get => "GET",
        }
    }
}

/// Incoming phone number resource
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingNumber {
    pub sid: String,
    pub phone_number: String,
    pub voice_url: Option<String>,
    pub voice_method: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IncomingNumberPage {
    incoming_phone_numbers: Vec<IncomingNumber>,
}

/// Phone number operations, abstracted for testing
#[async_trait]
pub trait PhoneNumberApi: Send + Sync {
    /// Look up an incoming number by its E.164 form
    async fn find_incoming_number(&self, phone_number: &str) -> Result<Option<IncomingNumber>>;

    async fn set_voice_webhook(
        &self,
        number_sid: &str,
        url: &str,
        method: WebhookMethod,
    ) -> Result<IncomingNumber>;
}

pub struct TwilioClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
}

impl TwilioClient {
    pub fn new(account_sid: String, auth_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            account_sid,
            auth_token,
        }
    }

    /// Build a client from `TWILIO_ACCOUNT_SID` and `TWILIO_AUTH_TOKEN`
    pub fn from_env() -> Result<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID").ok().filter(|s| !s.is_empty());
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN").ok().filter(|s| !s.is_empty());

        match (account_sid, auth_token) {
            (Some(sid), Some(token)) => Ok(Self::new(sid, token)),
            _ => bail!("Environment variables TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set."),
        }
    }

    fn numbers_url(&self) -> String {
        format!(
            "{}/Accounts/{}/IncomingPhoneNumbers",
            API_BASE, self.account_sid
        )
    }
}

#[async_trait]
impl PhoneNumberApi for TwilioClient {
    async fn find_incoming_number(&self, phone_number: &str) -> Result<Option<IncomingNumber>> {
        let page: IncomingNumberPage = self
            .http
            .get(format!("{}.json", self.numbers_url()))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .query(&[("PhoneNumber", phone_number)])
            .send()
            .await
            .context("Failed to list incoming phone numbers")?
            .error_for_status()
            .context("Twilio rejected phone number lookup")?
            .json()
            .await
            .context("Failed to parse phone number list")?;

        Ok(page.incoming_phone_numbers.into_iter().next())
    }

    async fn set_voice_webhook(
        &self,
        number_sid: &str,
        url: &str,
        method: WebhookMethod,
    ) -> Result<IncomingNumber> {
        let number = self
            .http
            .post(format!("{}/{}.json", self.numbers_url(), number_sid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("VoiceUrl", url), ("VoiceMethod", method.as_str())])
            .send()
            .await
            .context("Failed to update phone number")?
            .error_for_status()
            .context("Twilio rejected webhook update")?
            .json()
            .await
            .context("Failed to parse updated phone number")?;

        Ok(number)
    }
}

/// Point the Voice webhook of `phone_number` at `webhook_url`
pub async fn update_voice_webhook(
    api: &dyn PhoneNumberApi,
    phone_number: &str,
    webhook_url: &str,
    method: WebhookMethod,
) -> Result<IncomingNumber> {
    let Some(number) = api.find_incoming_number(phone_number).await? else {
        bail!("No incoming phone number found matching {}.", phone_number);
    };

    info!(
        "Updating {} ({}) voice webhook from {:?}",
        number.phone_number, number.sid, number.voice_url
    );

    api.set_voice_webhook(&number.sid, webhook_url, method).await
}
