//! Outbound mail. Lifecycle callers treat delivery as best-effort: a
//! failed send is logged and never rolls back the mutation that
//! triggered it.
//!
//! Transport is either an HTTP mail API (JSON POST, optional bearer key)
//! or an in-memory sink used by the test suites and when no endpoint is
//! configured. Transient failures are retried with exponential backoff.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail provider returned status {0}")]
    Status(u16),
}

impl MailError {
    /// Network failures and provider 5xx responses are worth retrying;
    /// 4xx responses are not.
    fn is_transient(&self) -> bool {
        match self {
            MailError::Transport(_) => true,
            MailError::Status(status) => *status >= 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SentMail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

pub enum MailTransport {
    /// JSON POST to a provider endpoint.
    Http {
        endpoint: String,
        api_key: Option<String>,
    },
    /// Records mail instead of delivering it.
    Memory,
}

pub struct Mailer {
    client: Client,
    transport: MailTransport,
    from: String,
    pub admin_email: String,
    app_base_url: String,
    retry_attempts: u32,
    outbox: Mutex<Vec<SentMail>>,
}

pub struct LeadConfirmationVars<'a> {
    pub name: &'a str,
    pub lead_id: &'a str,
    pub service: &'a str,
}

pub struct AdminNotificationVars<'a> {
    pub transaction_ref: &'a str,
    pub lead_id: &'a str,
    pub lead_name: &'a str,
    pub lead_email: &'a str,
}

pub struct VerificationVars<'a> {
    pub name: &'a str,
    pub lead_id: &'a str,
    pub status: &'a str,
    pub note: Option<&'a str>,
}

impl Mailer {
    pub fn new(
        transport: MailTransport,
        from: String,
        admin_email: String,
        app_base_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            client,
            transport,
            from,
            admin_email,
            app_base_url,
            retry_attempts: 3,
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Mail recorded by the in-memory transport.
    pub async fn sent(&self) -> Vec<SentMail> {
        self.outbox.lock().await.clone()
    }

    pub async fn send_lead_confirmation(
        &self,
        to: &str,
        vars: LeadConfirmationVars<'_>,
    ) -> Result<(), MailError> {
        let subject = format!("Request Received — {}", vars.service);
        let text = format!(
            "Hi {},\n\nWe received your request. Your Reference ID is: {}\n\n\
             Please proceed to payment (or continue later) at: {}/payment?leadId={}\n\n\
             If you have any questions, reply to this email.\n\nThanks.",
            vars.name, vars.lead_id, self.app_base_url, vars.lead_id
        );
        self.send(to, &subject, &text).await
    }

    pub async fn send_admin_notification(
        &self,
        vars: AdminNotificationVars<'_>,
    ) -> Result<(), MailError> {
        let subject = format!(
            "Payment declared: {} for lead {}",
            vars.transaction_ref, vars.lead_id
        );
        let text = format!(
            "Transaction declared for lead {} ({} / {}).\nView: {}/admin/transactions?leadId={}",
            vars.lead_id, vars.lead_name, vars.lead_email, self.app_base_url, vars.lead_id
        );
        let to = self.admin_email.clone();
        self.send(&to, &subject, &text).await
    }

    pub async fn send_user_verification(
        &self,
        to: &str,
        vars: VerificationVars<'_>,
    ) -> Result<(), MailError> {
        let subject = format!("Payment {} for Lead {}", vars.status, vars.lead_id);
        let note_line = vars
            .note
            .map(|n| format!("Note from admin: {}\n", n))
            .unwrap_or_default();
        let text = format!(
            "Hi {},\n\nYour payment for lead {} has been {}.\n{}\
             You can view details at {}/leads/{}\n\nThanks.",
            vars.name, vars.lead_id, vars.status, note_line, self.app_base_url, vars.lead_id
        );
        self.send(to, &subject, &text).await
    }

    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), MailError> {
        let mail = SentMail {
            to: to.to_string(),
            from: self.from.clone(),
            subject: subject.to_string(),
            text: text.to_string(),
        };

        let mut attempt = 0;
        loop {
            match self.deliver(&mail).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.retry_attempts || !err.is_transient() {
                        return Err(err);
                    }
                    // 200ms, 400ms, 800ms, ...
                    let delay = Duration::from_millis(2u64.pow(attempt) * 100);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "mail send failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn deliver(&self, mail: &SentMail) -> Result<(), MailError> {
        match &self.transport {
            MailTransport::Memory => {
                self.outbox.lock().await.push(mail.clone());
                Ok(())
            }
            MailTransport::Http { endpoint, api_key } => {
                let mut request = self.client.post(endpoint).json(mail);
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }
                let response = request
                    .send()
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(MailError::Status(response.status().as_u16()))
                }
            }
        }
    }
}
