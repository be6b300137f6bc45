//! Operator notification by email.

use std::fmt::Write as _;
use std::time::Duration;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument, warn};

use crate::core::types::{Attempt, FailureSummary, Problem};
use crate::error::{SolveError, SolveResult};
use crate::io::config::{MailConfig, MailSecrets};
use crate::io::persist::PersistReceipt;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

pub trait Notifier {
    fn notify(&self, email: &Email) -> SolveResult<()>;
}

/// Deliver `email`, logging instead of failing. Returns whether it was sent.
pub fn send_best_effort<N: Notifier + ?Sized>(notifier: &N, email: &Email) -> bool {
    match notifier.notify(email) {
        Ok(()) => {
            info!(subject = %email.subject, "notification sent");
            true
        }
        Err(err) => {
            warn!(err = %err, subject = %email.subject, "notification failed");
            false
        }
    }
}

/// SMTP with STARTTLS and login.
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: String,
    to: String,
}

impl SmtpNotifier {
    pub fn new(cfg: &MailConfig, secrets: &MailSecrets) -> SolveResult<Self> {
        let transport = SmtpTransport::starttls_relay(&cfg.smtp_host)
            .map_err(|e| SolveError::Notification(format!("smtp relay {}: {e}", cfg.smtp_host)))?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(
                secrets.user.clone(),
                secrets.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        Ok(Self {
            transport,
            from: secrets.user.clone(),
            to: secrets.to.clone(),
        })
    }
}

impl Notifier for SmtpNotifier {
    #[instrument(skip_all)]
    fn notify(&self, email: &Email) -> SolveResult<()> {
        let message = build_message(&self.from, &self.to, email)?;
        self.transport
            .send(&message)
            .map_err(|e| SolveError::Notification(format!("smtp send: {e}")))?;
        Ok(())
    }
}

fn build_message(from: &str, to: &str, email: &Email) -> SolveResult<Message> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| SolveError::Notification(format!("invalid sender '{from}': {e}")))?;
    let to: Mailbox = to
        .parse()
        .map_err(|e| SolveError::Notification(format!("invalid recipient '{to}': {e}")))?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| SolveError::Notification(format!("build message: {e}")))
}

/// Used when mail is disabled or not configured: writes the message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, email: &Email) -> SolveResult<()> {
        info!(subject = %email.subject, body = %email.body, "mail not configured, logging notification");
        Ok(())
    }
}

/// Success notification for an accepted attempt.
pub fn success_email(
    problem: &Problem,
    attempt: &Attempt,
    receipt: Option<&PersistReceipt>,
) -> Email {
    let verdict = &attempt.verdict;
    let saved = receipt.map_or_else(
        || "not saved (persistence failed)".to_string(),
        |r| r.path.display().to_string(),
    );
    let mut body = format!(
        "Your solution for {} ({}) was Accepted!\n\n",
        problem.title, problem.slug
    );
    let _ = writeln!(body, "Runtime: {}", verdict.runtime.as_deref().unwrap_or("N/A"));
    let _ = writeln!(body, "Memory: {}", verdict.memory.as_deref().unwrap_or("N/A"));
    let _ = writeln!(body, "Saved as: {saved}");
    if let Some(receipt) = receipt
        && receipt.committed
    {
        let _ = writeln!(body, "Pushed: {}", if receipt.pushed { "yes" } else { "no" });
    }
    let _ = writeln!(body, "Submission ID: {}", attempt.handle);
    let _ = writeln!(body, "Attempts: {}", attempt.index);
    let _ = write!(body, "\nDate: {}", problem.date);
    Email {
        subject: format!("✓ LeetCode Daily Accepted: {}", problem.title),
        body,
    }
}

/// Failure notification listing every attempt's feedback.
pub fn exhausted_email(problem: &Problem, failures: &[FailureSummary]) -> Email {
    let mut body = format!(
        "All {} attempts failed for {} ({}).\n",
        failures.len(),
        problem.title,
        problem.slug
    );
    for failure in failures {
        let _ = write!(
            body,
            "\n--- Attempt {} ---\n{}\n",
            failure.attempt,
            failure.feedback.trim_end()
        );
    }
    let _ = write!(body, "\nDate: {}", problem.date);
    Email {
        subject: format!("✗ LeetCode Daily FAILED: {}", problem.title),
        body,
    }
}
