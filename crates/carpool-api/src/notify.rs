use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

/// Outbound notification collaborator (verification mails, join/approve
/// notices). Delivery is attempted exactly once per call; a failure is
/// surfaced to the caller and never undoes already-committed state.
#[derive(Clone)]
pub enum Notifier {
    /// POST the notification to a mail relay webhook.
    Relay {
        client: Client,
        endpoint: String,
        sender: String,
    },
    /// No relay configured: log the notification and report success.
    Log,
}

impl Notifier {
    pub fn relay(endpoint: String, sender: String) -> Self {
        Self::Relay {
            client: Client::new(),
            endpoint,
            sender,
        }
    }

    pub async fn deliver(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        match self {
            Notifier::Relay {
                client,
                endpoint,
                sender,
            } => {
                let resp = client
                    .post(endpoint)
                    .json(&json!({
                        "from": sender,
                        "to": recipient,
                        "subject": subject,
                        "text": body,
                    }))
                    .send()
                    .await?;
                resp.error_for_status()?;
                Ok(())
            }
            Notifier::Log => {
                info!(recipient, subject, "notification (log only)");
                Ok(())
            }
        }
    }

    /// Deliver without failing the caller. Returns whether delivery
    /// succeeded; callers report this alongside their committed state change.
    pub async fn deliver_best_effort(&self, recipient: &str, subject: &str, body: &str) -> bool {
        match self.deliver(recipient, subject, body).await {
            Ok(()) => true,
            Err(err) => {
                warn!(recipient, "notification delivery failed: {err:#}");
                false
            }
        }
    }
}
