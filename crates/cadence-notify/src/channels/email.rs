//! Email channel sending notifications via SMTP.

use async_trait::async_trait;

use super::super::{DeliveryChannel, Error, Notification, Result};
use super::NotificationChannel;

/// Email channel for sending notifications via SMTP.
///
/// The recipient address comes from each notification; the channel only
/// carries transport configuration.
#[derive(Debug, Clone)]
pub struct EmailChannel {
    name: String,
    enabled: bool,
    smtp_server: String,
    smtp_port: u16,
    username: String,
    password: String,
    from_address: String,
}

impl EmailChannel {
    pub fn new(
        name: impl Into<String>,
        smtp_server: impl Into<String>,
        smtp_port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            smtp_server: smtp_server.into(),
            smtp_port,
            username: username.into(),
            password: password.into(),
            from_address: from_address.into(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn build_html_body(&self, notification: &Notification) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; }}
        .notification {{ padding: 20px; border-radius: 5px; }}
        .priority-normal {{ background-color: #d4edda; border-left: 4px solid #28a745; }}
        .priority-high {{ background-color: #fff3cd; border-left: 4px solid #ffc107; }}
        .priority-urgent {{ background-color: #f8d7da; border-left: 4px solid #dc3545; }}
        .timestamp {{ color: #6c757d; font-size: 0.9em; }}
    </style>
</head>
<body>
    <div class="notification priority-{}">
        <h2>{}</h2>
        <p class="timestamp">{}</p>
        <p>{}</p>
    </div>
</body>
</html>"#,
            notification.priority.as_str(),
            notification.title,
            notification.created_at.format("%Y-%m-%d %H:%M:%S"),
            notification.body
        )
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn delivery_kind(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }

        let from_mailbox: lettre::message::Mailbox = self
            .from_address
            .parse()
            .map_err(|e| Error::InvalidConfiguration(format!("Invalid from address: {}", e)))?;
        let to_mailbox: lettre::message::Mailbox = notification
            .recipient
            .parse()
            .map_err(|e| Error::SendFailed(format!("Invalid recipient address: {}", e)))?;

        let subject = format!("[{}] {}", notification.priority, notification.title);
        let html_body = self.build_html_body(notification);

        let email = lettre::Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(lettre::message::header::ContentType::TEXT_PLAIN)
                            .body(format!("{}\n\n{}", notification.title, notification.body)),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(lettre::message::header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| Error::SendFailed(format!("Failed to build email: {}", e)))?;

        let smtp_server = self.smtp_server.clone();
        let smtp_port = self.smtp_port;
        let username = self.username.clone();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || {
            let creds =
                lettre::transport::smtp::authentication::Credentials::new(username, password);
            let relay = format!("{}:{}", smtp_server, smtp_port);
            let mailer = lettre::SmtpTransport::relay(&relay)
                .map_err(|e| Error::SendFailed(format!("Invalid SMTP server: {}", e)))?
                .credentials(creds)
                .build();

            lettre::Transport::send(&mailer, &email)
                .map_err(|e| Error::SendFailed(format!("Failed to send email: {}", e)))?;

            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::SendFailed(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;

    #[tokio::test]
    async fn test_email_rejects_bad_recipient() {
        let channel = EmailChannel::new(
            "email",
            "smtp.example.com",
            587,
            "user",
            "secret",
            "cadence@example.com",
        );
        let n = Notification::new(
            "user-1",
            DeliveryChannel::Email,
            Priority::Normal,
            "Hello",
            "World",
            "not-an-address",
        );
        assert!(channel.send(&n).await.is_err());
    }

    #[tokio::test]
    async fn test_email_disabled() {
        let channel = EmailChannel::new(
            "email",
            "smtp.example.com",
            587,
            "user",
            "secret",
            "cadence@example.com",
        )
        .disabled();
        let n = Notification::new(
            "user-1",
            DeliveryChannel::Email,
            Priority::Normal,
            "Hello",
            "World",
            "someone@example.com",
        );
        assert!(matches!(
            channel.send(&n).await,
            Err(Error::ChannelDisabled(_))
        ));
    }
}
