//! Chat notifications for lending events
//!
//! Messages are delivered out of band: `NotificationService::notify` spawns the
//! send and only logs failures, so a slow or broken chat backend never affects
//! the request that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    config::NotificationsConfig,
    error::{AppError, AppResult},
    models::{book::Book, borrowing::Borrowing},
    repository::borrowings::OverdueBorrowing,
};

/// A sink accepting plain text messages for a destination
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> AppResult<()>;
}

/// Telegram Bot API `sendMessage`
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str) -> AppResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);

        self.client
            .post(url)
            .json(&SendMessage {
                chat_id: destination,
                text,
            })
            .send()
            .await
            .and_then(|response| response.error_for_status())
            // the URL carries the bot token
            .map_err(|e| AppError::Provider(format!("Telegram sendMessage failed: {}", e.without_url())))?;

        Ok(())
    }
}

/// Fallback sink when no bot is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: &str, text: &str) -> AppResult<()> {
        tracing::info!(destination, "Notification: {}", text);
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    destination: String,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, destination: impl Into<String>) -> Self {
        Self {
            notifier,
            destination: destination.into(),
        }
    }

    /// Telegram when a token and chat are configured, the log otherwise
    pub fn from_config(config: &NotificationsConfig) -> Self {
        let token = config.telegram_bot_token.as_deref().filter(|t| !t.is_empty());
        let chat = config.telegram_chat_id.as_deref().filter(|c| !c.is_empty());

        match (token, chat) {
            (Some(token), Some(chat)) => Self::new(
                Arc::new(TelegramNotifier::new(&config.telegram_api_url, token)),
                chat,
            ),
            _ => {
                tracing::warn!("Telegram is not configured, notifications will only be logged");
                Self::new(Arc::new(LogNotifier), "log")
            }
        }
    }

    /// Send in the background; failures are logged, never returned
    pub fn notify(&self, text: String) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let destination = self.destination.clone();

        tokio::spawn(async move {
            if let Err(e) = notifier.send(&destination, &text).await {
                tracing::error!("Failed to deliver notification: {}", e);
            }
        })
    }
}

pub fn borrowing_created_message(book: &Book, borrowing: &Borrowing) -> String {
    format!(
        "New borrowing: {}\nBorrow date: {}\nExpected return date: {}\nDaily fee: {}",
        book.title, borrowing.borrow_date, borrowing.expected_return_date, book.daily_fee
    )
}

pub fn borrowing_returned_message(book: &Book, borrowing: &Borrowing, amount: i64) -> String {
    let returned = borrowing
        .actual_return_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    format!(
        "Book returned: {}\nBorrowing: #{}\nReturned on: {}\nAmount due: {}.{:02}",
        book.title,
        borrowing.id,
        returned,
        amount / 100,
        amount % 100
    )
}

pub fn overdue_message(overdue: &OverdueBorrowing) -> String {
    format!(
        "Overdue borrowing:\nUser: {}\nBook: {}\nExpected return date: {}",
        overdue.user_email, overdue.book_title, overdue.expected_return_date
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Cover;
    use chrono::NaiveDate;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn book() -> Book {
        Book {
            id: 3,
            title: "On the Road".to_string(),
            author: "Jack Kerouac".to_string(),
            cover: Cover::Hard,
            inventory: 4,
            daily_fee: dec!(0.77),
        }
    }

    fn borrowing() -> Borrowing {
        Borrowing {
            id: 12,
            borrow_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            expected_return_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            actual_return_date: Some(NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()),
            book_id: 3,
            user_id: 9,
            penalty_for_delay: None,
            is_active: false,
        }
    }

    #[tokio::test]
    async fn notify_sends_to_configured_destination() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .with(eq("chat-42"), eq("hello"))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = NotificationService::new(Arc::new(notifier), "chat-42");
        service.notify("hello".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn notify_swallows_delivery_failures() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_, _| Err(AppError::Provider("bot blocked".to_string())));

        let service = NotificationService::new(Arc::new(notifier), "chat");
        // the spawned task completes without panicking
        assert!(service.notify("hello".to_string()).await.is_ok());
    }

    #[test]
    fn unconfigured_telegram_falls_back_to_log() {
        let config = NotificationsConfig {
            telegram_api_url: "https://api.telegram.org".to_string(),
            telegram_bot_token: Some(String::new()),
            telegram_chat_id: Some("1".to_string()),
        };
        let service = NotificationService::from_config(&config);
        assert_eq!(service.destination, "log");
    }

    #[test]
    fn created_message_names_book_and_dates() {
        let message = borrowing_created_message(&book(), &borrowing());
        assert!(message.starts_with("New borrowing: On the Road"));
        assert!(message.contains("Borrow date: 2024-05-01"));
        assert!(message.contains("Expected return date: 2024-05-06"));
    }

    #[test]
    fn returned_message_formats_amount_in_currency_units() {
        let message = borrowing_returned_message(&book(), &borrowing(), 231);
        assert!(message.contains("Returned on: 2024-05-04"));
        assert!(message.ends_with("Amount due: 2.31"));
    }

    #[test]
    fn overdue_message_names_user_and_book() {
        let overdue = OverdueBorrowing {
            borrowing_id: 1,
            user_email: "reader@test.com".to_string(),
            book_title: "Dune".to_string(),
            expected_return_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        };
        let message = overdue_message(&overdue);
        assert!(message.starts_with("Overdue borrowing:\nUser: reader@test.com\nBook: Dune"));
    }
}
