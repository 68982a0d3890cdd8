//! Email collaborator
//!
//! All lifecycle notifications go through the `Mailer` trait so tests
//! can record sends instead of hitting the network. Sending is always
//! fire-and-forget: implementations log failures and never surface
//! them, because a lost email must not roll back a committed state
//! change.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// The notification being sent. Each variant maps to one subject and
/// body template, parameterized by the product name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// Intake query rejected by an admin
    QueryRejected,
    /// Query promoted into a live listing
    ProductAccepted,
    /// Listing removed by an admin
    ProductDeleted,
    /// Listing removed because its stock reached zero
    ProductDepleted,
    /// A watched catalog product has stock again
    BackInStock,
}

impl MailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::QueryRejected => "Query Rejected",
            Self::ProductAccepted => "Product Accepted",
            Self::ProductDeleted | Self::ProductDepleted => "Product Deleted",
            Self::BackInStock => "Product Back in Stock!",
        }
    }

    pub fn body(&self, product_name: &str) -> String {
        match self {
            Self::QueryRejected => format!(
                "<p>Your query regarding the product <b>{product_name}</b> has been rejected. \
                 Sorry, we are not forwarding your product to our shop.</p>"
            ),
            Self::ProductAccepted => format!(
                "<p>Congratulations! Your product <b>{product_name}</b> has been accepted and \
                 will be forwarded to our shop. Please send your bank details through the \
                 contact page so we can pay you when your product is sold.</p>"
            ),
            Self::ProductDeleted => format!(
                "<p>We are sorry to inform you that your product <b>{product_name}</b> has been \
                 removed from our shop. Feel free to contact us for more information, or submit \
                 a new query for a different product.</p>"
            ),
            Self::ProductDepleted => format!(
                "<p>We are sorry to inform you that your product <b>{product_name}</b> has been \
                 removed from our shop because its stock ran out. You can submit a new query \
                 for the same or a different product.</p>"
            ),
            Self::BackInStock => format!(
                "<p>The product <b>{product_name}</b> is now back in stock! Order now before it \
                 runs out again.</p>"
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a notification. Never fails; implementations log errors.
    async fn send(&self, to: &str, template: MailTemplate, product_name: &str);
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

/// Mailer backed by the Resend HTTP API. With an empty API key it
/// degrades to logging only, which keeps local development working
/// without credentials.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, template: MailTemplate, product_name: &str) {
        if self.api_key.is_empty() {
            debug!(to, template = ?template, "Mail delivery disabled, skipping send");
            return;
        }
        let payload = ResendPayload {
            from: &self.from,
            to,
            subject: template.subject(),
            html: template.body(product_name),
        };
        let result = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!(to, template = ?template, "Notification email sent");
            }
            Ok(resp) => {
                warn!(to, status = %resp.status(), "Notification email rejected by provider");
            }
            Err(e) => {
                warn!(to, error = %e, "Failed to send notification email");
            }
        }
    }
}
