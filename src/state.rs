use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    database::{PgStore, Store},
    email::{ConsoleMailer, EmailSender},
    payment::{MockPaymentProvider, PaymentProvider},
};

/// Shared handles for the request handlers. Storage and the providers are
/// injected capabilities so tests can swap them without touching the
/// services.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentProvider>,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let pool = PgPool::connect(&config.database_url).await.unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();

        Self::with_parts(
            config,
            Arc::new(PgStore::new(pool)),
            Arc::new(MockPaymentProvider),
            Arc::new(ConsoleMailer),
        )
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentProvider>,
        mailer: Arc<dyn EmailSender>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            payments,
            mailer,
        })
    }
}
