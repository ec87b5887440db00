//!
//! # Outbound Email
//!
//! Delivery of verification emails through the Resend HTTP API. The `Mailer`
//! trait is the seam the verification flow depends on, so tests can substitute
//! an in-memory implementation and the registration transaction can treat
//! delivery as a single fallible call.

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Timeout on the outbound send. Email delivery is the one external blocking
/// call in the system and must fail rather than hang the request.
const SEND_TIMEOUT_SECS: u64 = 10;

/// Contract for sending a single email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), AppError>;
}

/// `Mailer` implementation backed by the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from: String,
}

impl ResendMailer {
    /// Creates a mailer. The API key is optional so the server can boot
    /// without one; sends will fail with a delivery error until it is set.
    pub fn new(api_key: Option<String>, from: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::DeliveryFailure("Resend API key not configured".into())
        })?;

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": html_body,
                "text": text_body,
            }))
            .send()
            .await
            .map_err(|e| AppError::DeliveryFailure(format!("Failed to send email: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Resend rejected email to {}: {} {}", to, status, body);
            Err(AppError::DeliveryFailure(format!(
                "Email provider returned {}",
                status
            )))
        }
    }
}

/// Renders the verification email and hands it to the mailer.
pub async fn send_verification_email(
    mailer: &dyn Mailer,
    to: &str,
    code: &str,
) -> Result<(), AppError> {
    let subject = "Verification Code - Taskloop";
    let html_body = format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <div style="background-color: #f8f9fa; padding: 30px; border-radius: 10px; text-align: center;">
    <h1 style="color: #333; margin-bottom: 20px;">Taskloop</h1>
    <h2 style="color: #007bff; margin-bottom: 30px;">Verification Code</h2>
    <p style="font-size: 16px; color: #666; margin-bottom: 30px;">
      Use the code below to verify your account:
    </p>
    <div style="background-color: #007bff; color: white; font-size: 32px; font-weight: bold; padding: 20px; border-radius: 8px; letter-spacing: 4px; margin: 30px 0;">
      {code}
    </div>
    <p style="font-size: 14px; color: #999; margin-top: 30px;">
      This code expires in 10 minutes.<br>
      If you did not request this code, please ignore this email.
    </p>
  </div>
</body>
</html>"#
    );
    let text_body = format!(
        "Taskloop - Verification Code\n\n\
         Use the code below to verify your account:\n\n\
         {code}\n\n\
         This code expires in 10 minutes.\n\
         If you did not request this code, please ignore this email."
    );

    mailer.send(to, subject, &html_body, &text_body).await
}
