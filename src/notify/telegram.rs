//! Telegram delivery and command polling on a teloxide [`Bot`].
//!
//! Alerts go out as HTML with an optional inline status button. Commands are
//! long-polled with `getUpdates`; the engine owns the update cursor. Updates
//! from chats other than the configured one are reduced to
//! [`UpdateKind::Other`].

use super::format::{Button, render};
use super::{Alert, CommandChannel, Notifier, Update, UpdateKind};
use crate::config::TelegramConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, Recipient,
};
use tracing::{debug, warn};

/// Added on top of the long-poll window for the HTTP request timeout.
const REQUEST_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TelegramClient {
    bot: Bot,
    recipient: Recipient,
    /// `None` for `@channel` targets, which cannot be compared to chat ids.
    allowed_chat: Option<ChatId>,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// `poll_timeout` is the `getUpdates` long-poll window; zero polls once.
    pub fn new(config: &TelegramConfig, poll_timeout: Duration) -> Result<Self> {
        let http = teloxide::net::default_reqwest_settings()
            .timeout(poll_timeout + REQUEST_MARGIN)
            .build()
            .map_err(|e| AppError::Config(format!("telegram http client: {e}")))?;
        let bot = Bot::with_client(&config.bot_token, http).set_api_url(config.api_url.clone());
        let recipient = recipient(&config.chat_id);
        let allowed_chat = match &recipient {
            Recipient::Id(id) => Some(*id),
            Recipient::ChannelUsername(_) => None,
        };
        Ok(Self {
            bot,
            recipient,
            allowed_chat,
            poll_timeout,
        })
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, alert: &Alert) -> bool {
        let message = render(alert);
        let request = self
            .bot
            .send_message(self.recipient.clone(), message.text)
            .parse_mode(ParseMode::Html);
        let result = match &message.button {
            Some(button) => request.reply_markup(keyboard(button)).await,
            None => request.await,
        };
        match result {
            Ok(_) => {
                debug!("[TG] message delivered");
                true
            }
            Err(e) => {
                warn!(error = %e, "[TG] sendMessage failed");
                false
            }
        }
    }
}

#[async_trait]
impl CommandChannel for TelegramClient {
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let timeout = u32::try_from(self.poll_timeout.as_secs()).unwrap_or(u32::MAX);
        let mut request = self
            .bot
            .get_updates()
            .timeout(timeout)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);
        if let Some(offset) = offset {
            let offset = i32::try_from(offset).map_err(|_| AppError::Api {
                venue: "telegram",
                message: format!("update offset {offset} out of range"),
            })?;
            request = request.offset(offset);
        }
        let updates = request.await?;
        Ok(updates
            .iter()
            .map(|u| convert(u, self.allowed_chat))
            .collect())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<()> {
        self.bot.answer_callback_query(callback_id).await?;
        Ok(())
    }
}

/// Numeric ids address a chat directly; anything else is a channel username.
fn recipient(chat_id: &str) -> Recipient {
    match chat_id.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.trim().to_string()),
    }
}

fn keyboard(button: &Button) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        button.label,
        button.callback_data,
    )]])
}

fn is_authorized(chat: Option<ChatId>, allowed: Option<ChatId>) -> bool {
    match (chat, allowed) {
        (Some(chat), Some(allowed)) if chat != allowed => {
            warn!(chat_id = chat.0, "[TG] ignoring update from unauthorized chat");
            false
        }
        _ => true,
    }
}

fn convert(update: &teloxide::types::Update, allowed: Option<ChatId>) -> Update {
    use teloxide::types::UpdateKind as Kind;

    let authorized = is_authorized(update.chat().map(|c| c.id), allowed);
    let kind = match &update.kind {
        Kind::Message(msg) if authorized => match msg.text() {
            Some(text) => UpdateKind::Text(text.to_string()),
            None => UpdateKind::Other,
        },
        Kind::CallbackQuery(query) if authorized => UpdateKind::Callback {
            id: query.id.clone(),
            data: query.data.clone(),
        },
        _ => UpdateKind::Other,
    };
    Update {
        id: i64::from(update.id.0),
        kind,
    }
}
