//! Invitation delivery.
//!
//! The SMTP notifier is used when `INVITE_EMAILS_ENABLED=true`; otherwise issued
//! invitations are only logged.

use async_trait::async_trait;
use companion_core::models::Invitation;
use companion_core::{AppError, Config};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    /// Called once per successfully issued invitation with its raw token.
    async fn invitation_issued(&self, invitation: &Invitation, token: &str)
        -> Result<(), AppError>;
}

/// Records issuance in the log. The token is never written out.
#[derive(Debug, Clone, Default)]
pub struct LogInvitationNotifier;

#[async_trait]
impl InvitationNotifier for LogInvitationNotifier {
    async fn invitation_issued(
        &self,
        invitation: &Invitation,
        _token: &str,
    ) -> Result<(), AppError> {
        tracing::info!(
            invitation_id = %invitation.id,
            email = %invitation.email,
            role = %invitation.role,
            expires_at = %invitation.expires_at,
            "Invitation ready for delivery (email disabled)"
        );
        Ok(())
    }
}

/// Sends a plain-text invitation email over SMTP.
#[derive(Clone)]
pub struct SmtpInvitationNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    frontend_url: Option<String>,
}

impl SmtpInvitationNotifier {
    /// Returns `None` if invitation emails are disabled or SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.invite_emails_enabled {
            tracing::debug!("Invitation emails disabled (INVITE_EMAILS_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.clone()?;
        let port = config.smtp_port;
        let credentials = match (&config.smtp_user, &config.smtp_password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let mailer = if config.smtp_tls {
            let b = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(b) => b.port(port),
                Err(e) => {
                    tracing::warn!(
                        host = %host,
                        error = %e,
                        "Failed to configure STARTTLS relay; invitation emails fall back to the log notifier"
                    );
                    return None;
                }
            };
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Invitation mailer initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Invitation mailer initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
            frontend_url: config.frontend_url.clone(),
        })
    }

    fn body(&self, invitation: &Invitation, token: &str) -> String {
        let link = match &self.frontend_url {
            Some(base) => format!("{}/invite/accept?token={}", base.trim_end_matches('/'), token),
            None => format!("Invitation token: {}", token),
        };
        format!(
            "You have been invited to join your team as {}.\n\n{}\n\nThis invitation expires on {}.\n",
            invitation.role,
            link,
            invitation.expires_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

#[async_trait]
impl InvitationNotifier for SmtpInvitationNotifier {
    async fn invitation_issued(
        &self,
        invitation: &Invitation,
        token: &str,
    ) -> Result<(), AppError> {
        let to: Mailbox = invitation
            .email
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid recipient address: {}", e)))?;
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM: {}", e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject("You're invited")
            .header(ContentType::TEXT_PLAIN)
            .body(self.body(invitation, token))
            .map_err(|e| AppError::Internal(format!("Failed to build invitation email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send invitation email: {}", e)))?;

        tracing::info!(invitation_id = %invitation.id, "Invitation email sent");
        Ok(())
    }
}

/// SMTP when enabled and configured, the log notifier otherwise.
pub fn create_notifier(config: &Config) -> Arc<dyn InvitationNotifier> {
    match SmtpInvitationNotifier::from_config(config) {
        Some(smtp) => Arc::new(smtp),
        None => Arc::new(LogInvitationNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_emails_have_no_smtp_notifier() {
        let config = Config::for_memory("0123456789abcdef0123456789abcdef");
        assert!(SmtpInvitationNotifier::from_config(&config).is_none());
    }

    #[test]
    fn test_enabled_emails_without_host_have_no_smtp_notifier() {
        let mut config = Config::for_memory("0123456789abcdef0123456789abcdef");
        config.invite_emails_enabled = true;
        config.smtp_from = Some("noreply@companion.test".to_string());
        assert!(SmtpInvitationNotifier::from_config(&config).is_none());
    }

    #[test]
    fn test_plain_smtp_notifier_builds_without_connecting() {
        let mut config = Config::for_memory("0123456789abcdef0123456789abcdef");
        config.invite_emails_enabled = true;
        config.smtp_host = Some("localhost".to_string());
        config.smtp_from = Some("noreply@companion.test".to_string());
        config.smtp_tls = false;
        assert!(SmtpInvitationNotifier::from_config(&config).is_some());
    }
}
