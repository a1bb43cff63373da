// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Telegram notifier module.

use async_trait::async_trait;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{error, info};

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a best-effort delivery. Only ever logged.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Delivered,
    Failed(String),
}

/// Fire-and-forget message sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Delivery;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: &str) -> Result<Self, String> {
        info!("📱 Initializing Telegram: chat_id={}", chat_id);

        let client = teloxide::net::default_reqwest_settings()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| format!("Failed to build Telegram client: {}", e))?;

        Ok(Self {
            bot: Bot::with_client(token, client),
            recipient: parse_recipient(chat_id),
        })
    }
}

/// Numeric ids address chats directly; anything else is a channel username.
fn parse_recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(num) => Recipient::Id(ChatId(num)),
        Err(_) if chat_id.starts_with('@') => Recipient::ChannelUsername(chat_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{}", chat_id)),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Delivery {
        match self.bot.send_message(self.recipient.clone(), text).await {
            Ok(_) => {
                info!("📤 Sent Telegram message");
                Delivery::Delivered
            }
            Err(e) => {
                error!("Failed to send Telegram message: {}", e);
                Delivery::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every message; optionally reports failure.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) sent: Mutex<Vec<String>>,
        pub(crate) fail: bool,
    }

    impl RecordingNotifier {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Delivery {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                Delivery::Failed("telegram unreachable".to_string())
            } else {
                Delivery::Delivered
            }
        }
    }

    #[test]
    fn numeric_chat_ids_are_direct() {
        assert_eq!(parse_recipient("-1001234"), Recipient::Id(ChatId(-1001234)));
        assert_eq!(parse_recipient(" 42 "), Recipient::Id(ChatId(42)));
    }

    #[test]
    fn other_chat_ids_are_channels() {
        assert_eq!(
            parse_recipient("@coindip_alerts"),
            Recipient::ChannelUsername("@coindip_alerts".to_string())
        );
        assert_eq!(
            parse_recipient("coindip_alerts"),
            Recipient::ChannelUsername("@coindip_alerts".to_string())
        );
    }
}
