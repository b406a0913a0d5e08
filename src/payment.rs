//! Payment capability. Contributions are charged through [`PaymentProvider`];
//! the mock stands in for a real gateway and always settles.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppError, models::PaymentStatus};

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub user_id: Uuid,
    pub pool_id: Uuid,
    pub amount: f64,
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub status: PaymentStatus,
    pub reference: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Label recorded on the contribution row.
    fn name(&self) -> &'static str;

    async fn process_payment(&self, request: PaymentRequest) -> Result<PaymentReceipt, AppError>;
}

pub struct MockPaymentProvider;

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    fn name(&self) -> &'static str {
        "MOCK"
    }

    async fn process_payment(&self, _request: PaymentRequest) -> Result<PaymentReceipt, AppError> {
        Ok(PaymentReceipt {
            status: PaymentStatus::Paid,
            reference: Uuid::new_v4().to_string(),
        })
    }
}
