// Point a Twilio phone number's Voice webhook at a loqa-calls deployment
//
// Usage: update-webhook -p +15551234567 -w https://calls.example.com/voice
//
// Credentials are read from TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN.

use anyhow::Result;
use clap::Parser;
use loqa_calls::twilio::{update_voice_webhook, TwilioClient, WebhookMethod};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "update-webhook")]
#[command(about = "Update Twilio Voice webhook URL for a phone number.")]
struct Args {
    /// Phone number
    #[arg(short, long)]
    phone_number: String,

    /// Public URL for Twilio webhook
    #[arg(short, long)]
    webhook_url: String,

    /// HTTP method Twilio should use when requesting the webhook
    #[arg(short, long, value_enum, default_value = "POST")]
    method: WebhookMethod,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let client = TwilioClient::from_env()?;

    update_voice_webhook(&client, &args.phone_number, &args.webhook_url, args.method).await?;

    println!(
        "Updated {} Voice webhook : {} ({})",
        args.phone_number,
        args.webhook_url,
        args.method.as_str()
    );

    Ok(())
}
