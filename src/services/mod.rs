//! Business logic services

pub mod books;
pub mod borrowings;
pub mod checkout;
pub mod notifications;
pub mod payments;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

use checkout::{PaymentGateway, StripeGateway};
use notifications::NotificationService;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub borrowings: borrowings::BorrowingsService,
    pub payments: payments::PaymentsService,
    pub users: users::UsersService,
    pub notifications: NotificationService,
    pub repository: Repository,
}

impl Services {
    /// Wire the production collaborators from configuration
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let notifications = NotificationService::from_config(&config.notifications);
        let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(&config.payments));
        Self::with_collaborators(repository, config, notifications, gateway)
    }

    pub fn with_collaborators(
        repository: Repository,
        config: &AppConfig,
        notifications: NotificationService,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let payments =
            payments::PaymentsService::new(repository.clone(), gateway, &config.server.public_url);

        Self {
            books: books::BooksService::new(repository.clone()),
            borrowings: borrowings::BorrowingsService::new(
                repository.clone(),
                payments.clone(),
                notifications.clone(),
                config.lending.penalty_for_delay,
            ),
            payments,
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            notifications,
            repository,
        }
    }
}
