use reqwest::Client;
use serde::Serialize;

#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Debug, Serialize)]
struct ResendRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

impl EmailClient {
    pub fn new(api_key: &str, from_email: &str, from_name: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
        }
    }

    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), String> {
        let request = ResendRequest {
            from: format!("{} <{}>", self.from_name, self.from_email),
            to: vec![to.to_string()],
            subject: subject.to_string(),
            html: html.to_string(),
        };

        let response = self.client
            .post("https://api.resend.com/emails")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("email send failed: {e}"))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("email API error: {body}"));
        }

        tracing::debug!(to = %to, subject = %subject, "email sent");
        Ok(())
    }

    /// Support-ticket reply notification.
    pub async fn send_ticket_reply(
        &self,
        to: &str,
        reference: &str,
        subject: &str,
        preview: &str,
    ) -> Result<(), String> {
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
            <h2 style="color: #e25822;">Ticket #{reference} — {subject}</h2>
            <p>There is a new reply on your support ticket:</p>
            <blockquote style="background: #f4f4f4; padding: 16px; border-left: 4px solid #e25822;">{preview}</blockquote>
            <p style="color: #666; margin-top: 20px;">Reply from your ticket page; replies to this email are not monitored.</p>
            </div>"#
        );

        self.send_email(to, &format!("New reply on ticket #{reference}"), &html).await
    }
}
