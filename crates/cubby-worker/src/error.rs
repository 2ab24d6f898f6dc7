//! Errors raised by a notification pass.

use std::time::Duration;

use cubby_core::error::{AppError, ErrorKind};

/// Failure of one pass, or of one of its stages
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Trackers and their latest entries could not be read
    #[error("Failed to resolve due trackers: {0}")]
    DueSet(#[source] AppError),

    /// Eligible recipients could not be read
    #[error("Failed to resolve recipients: {0}")]
    Recipients(#[source] AppError),

    /// The push gateway failed for the whole batch. No ledger rows were
    /// written.
    #[error("Push gateway failed: {0}")]
    Gateway(#[source] AppError),

    /// Some messages were rejected or some ledger writes failed. Ledger
    /// rows for delivered messages were kept.
    #[error(
        "Partial delivery: {failed_messages} of {total_messages} messages failed, \
         {failed_ledger_writes} ledger writes failed"
    )]
    PartialDelivery {
        /// Messages the gateway did not accept
        failed_messages: usize,
        /// Ledger upserts that failed after a successful send
        failed_ledger_writes: usize,
        /// Messages in the batch
        total_messages: usize,
    },

    /// The pass did not finish before its deadline
    #[error("Notification pass exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

impl From<NotifyError> for AppError {
    fn from(err: NotifyError) -> Self {
        let kind = match &err {
            NotifyError::DueSet(e) | NotifyError::Recipients(e) => e.kind,
            NotifyError::Gateway(_) | NotifyError::PartialDelivery { .. } => {
                ErrorKind::ExternalService
            }
            NotifyError::Timeout(_) => ErrorKind::Timeout,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_delivery_message() {
        let err = NotifyError::PartialDelivery {
            failed_messages: 1,
            failed_ledger_writes: 0,
            total_messages: 2,
        };
        assert_eq!(
            err.to_string(),
            "Partial delivery: 1 of 2 messages failed, 0 ledger writes failed"
        );
    }

    #[test]
    fn test_into_app_error_keeps_kind() {
        let err: AppError = NotifyError::DueSet(AppError::database("down")).into();
        assert!(err.is(ErrorKind::Database));

        let err: AppError = NotifyError::Timeout(Duration::from_secs(10)).into();
        assert!(err.is(ErrorKind::Timeout));
    }
}
