use async_trait::async_trait;
use common::config::BotConfig;
use common::notify::{Notifier, NotifyError};
use teloxide::prelude::*;
use teloxide::RequestError;
use tracing::{debug, error, info};

/// Delivers notifications to one Telegram chat.
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(&config.telegram_token, config.telegram_chat_id)
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Username of the recipient, when the chat is a private one.
    async fn recipient_username(&self) -> Option<String> {
        let user_id = u64::try_from(self.chat_id.0).ok().map(UserId)?;
        match self.bot.get_chat_member(self.chat_id, user_id).await {
            Ok(member) => member.user.username,
            Err(e) => {
                debug!(chat_id = %self.chat_id, "Could not resolve recipient: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        info!(chat_id = %self.chat_id, "Sending Telegram message: {}", text);

        if let Err(e) = self.bot.send_message(self.chat_id, text.to_string()).await {
            error!(chat_id = %self.chat_id, "Message was not sent: {}", e);
            return Err(into_notify_error(self.chat_id, e));
        }

        let recipient = self
            .recipient_username()
            .await
            .unwrap_or_else(|| self.chat_id.to_string());
        info!(recipient = %recipient, "Message delivered: {}", text);
        Ok(())
    }
}

fn into_notify_error(chat_id: ChatId, err: RequestError) -> NotifyError {
    match err {
        RequestError::Api(api) => NotifyError::Recipient(format!("{} ({})", chat_id, api)),
        other => NotifyError::Delivery(other.to_string()),
    }
}
