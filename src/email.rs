//! Transactional email through a SendGrid-style HTTP API.
//!
//! Delivery is best effort: every failure is logged and reported as `false`,
//! never as an error.

use pulldown_cmark::{Event, Parser};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    db::users::User,
    include_res,
    res::{escape_html, fill},
};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from_email: String,
    frontend_url: String,
}

impl Mailer {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        if config.sendgrid_api_key.is_none() {
            warn!("SendGrid API key not found, email notifications are disabled");
        }

        Self {
            http,
            api_url: config.sendgrid_api_url.clone(),
            api_key: config.sendgrid_api_key.clone(),
            from_email: config.from_email.clone(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn send_connection_request(&self, receiver: &User, sender_name: &str, message: Option<&str>) -> bool {
        let link = format!("{}/connections", self.frontend_url);
        self.send(connection_request_mail(receiver, sender_name, message, &link)).await
    }

    pub async fn send_connection_accepted(&self, sender: &User, accepter_name: &str) -> bool {
        let link = format!("{}/messaging", self.frontend_url);
        self.send(connection_accepted_mail(sender, accepter_name, &link)).await
    }

    pub async fn send_new_message(
        &self,
        receiver: &User,
        sender_name: &str,
        content: &str,
        conversation_id: Uuid,
    ) -> bool {
        let link = format!("{}/messaging?conversation={conversation_id}", self.frontend_url);
        self.send(new_message_mail(receiver, sender_name, content, &link)).await
    }

    async fn send(&self, mail: Mail) -> bool {
        let Some(api_key) = &self.api_key else {
            warn!("email disabled, skipping {:?} to {}", mail.subject, mail.to);
            return false;
        };

        match self.deliver(api_key, &mail).await {
            Ok(()) => {
                info!("email {:?} sent to {}", mail.subject, mail.to);
                true
            }
            Err(e) => {
                error!("failed to send email {:?} to {}: {e:#}", mail.subject, mail.to);
                false
            }
        }
    }

    async fn deliver(&self, api_key: &str, mail: &Mail) -> anyhow::Result<()> {
        let body = SendGridMail {
            personalizations: [Personalization { to: [Address { email: &mail.to }] }],
            from: Address { email: &self.from_email },
            subject: &mail.subject,
            content: [
                Content { kind: "text/plain", value: &mail.text },
                Content { kind: "text/html", value: &mail.html },
            ],
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::ACCEPTED => Ok(()),
            status => Err(anyhow::anyhow!("mail provider answered {status}")),
        }
    }
}

#[derive(Serialize)]
struct SendGridMail<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

pub fn connection_request_mail(receiver: &User, sender_name: &str, message: Option<&str>, link: &str) -> Mail {
    let message = message.map(str::trim).filter(|m| !m.is_empty());
    let message_block = message
        .map(|m| format!("<blockquote style=\"font-style: italic;\">\"{}\"</blockquote>", escape_html(m)))
        .unwrap_or_default();
    let message_line = message.map(|m| format!("Message: {m}\n")).unwrap_or_default();

    Mail {
        to: receiver.email.clone(),
        subject: format!("New Connection Request from {sender_name}"),
        text: fill(
            include_res!(str, "/emails/connection_request.txt"),
            &[
                ("receiver_name", receiver.name.as_str()),
                ("sender_name", sender_name),
                ("message_line", message_line.as_str()),
                ("link", link),
            ],
        ),
        html: fill(
            include_res!(str, "/emails/connection_request.html"),
            &[
                ("receiver_name", escape_html(&receiver.name).as_str()),
                ("sender_name", escape_html(sender_name).as_str()),
                ("message_block", message_block.as_str()),
                ("link", link),
            ],
        ),
    }
}

pub fn connection_accepted_mail(sender: &User, accepter_name: &str, link: &str) -> Mail {
    Mail {
        to: sender.email.clone(),
        subject: format!("{accepter_name} accepted your connection request!"),
        text: fill(
            include_res!(str, "/emails/connection_accepted.txt"),
            &[("sender_name", sender.name.as_str()), ("accepter_name", accepter_name), ("link", link)],
        ),
        html: fill(
            include_res!(str, "/emails/connection_accepted.html"),
            &[
                ("sender_name", escape_html(&sender.name).as_str()),
                ("accepter_name", escape_html(accepter_name).as_str()),
                ("link", link),
            ],
        ),
    }
}

pub fn new_message_mail(receiver: &User, sender_name: &str, content: &str, link: &str) -> Mail {
    let preview = preview(content);

    Mail {
        to: receiver.email.clone(),
        subject: format!("New Message from {sender_name}"),
        text: fill(
            include_res!(str, "/emails/new_message.txt"),
            &[
                ("receiver_name", receiver.name.as_str()),
                ("sender_name", sender_name),
                ("preview", preview.as_str()),
                ("link", link),
            ],
        ),
        html: fill(
            include_res!(str, "/emails/new_message.html"),
            &[
                ("receiver_name", escape_html(&receiver.name).as_str()),
                ("sender_name", escape_html(sender_name).as_str()),
                ("preview", render_markdown(&preview).as_str()),
                ("link", link),
            ],
        ),
    }
}

/// First 100 characters of a message, with an ellipsis when cut.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_owned(),
    }
}

/// Markdown to HTML with any raw HTML in the source shown as text.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new(text).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}
