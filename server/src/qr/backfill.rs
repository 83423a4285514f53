use serde::Serialize;
use tracing::{error, info, warn};

use super::issuance::QrIssuer;

/// Outcome of a sweep, serialized as the HTTP response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillReport {
    pub success: bool,
    pub fixed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Issue tokens for every paid ticket and subscription that lacks one.
///
/// Items are processed one at a time; a failed item is recorded as
/// `"<id>: <reason>"` and the sweep moves on. Only a failure of the initial
/// selection marks the report unsuccessful. Re-running after a clean sweep
/// selects nothing.
pub async fn run_backfill(issuer: &QrIssuer) -> BackfillReport {
    let unresolved = match issuer.store().list_unresolved_paid().await {
        Ok(unresolved) => unresolved,
        Err(e) => {
            error!(error = %e, "QR backfill could not select unresolved rows");
            return BackfillReport {
                success: false,
                fixed_count: 0,
                errors: Some(vec![format!("selection failed: {e}")]),
            };
        }
    };

    info!(candidates = unresolved.len(), "Starting QR backfill");

    let mut fixed_count = 0;
    let mut errors = Vec::new();
    for entity in unresolved {
        match issuer.issue(entity).await {
            Ok(issued) if issued.newly_issued => fixed_count += 1,
            Ok(_) => {}
            Err(e) => {
                warn!(entity = %entity, error = %e, "QR backfill item failed");
                errors.push(format!("{}: {}", entity.id, e));
            }
        }
    }

    info!(fixed_count, failed = errors.len(), "QR backfill finished");

    BackfillReport {
        success: true,
        fixed_count,
        errors: (!errors.is_empty()).then_some(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::PaymentStatus;
    use crate::qr::token::RandomTokenGenerator;
    use crate::store::{InMemoryTicketStore, InMemoryUserDirectory};
    use crate::test_support;

    fn issuer(store: &Arc<InMemoryTicketStore>) -> QrIssuer {
        QrIssuer::new(
            store.clone(),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(RandomTokenGenerator),
        )
    }

    #[tokio::test]
    async fn test_sweep_fixes_only_paid_rows_without_token() {
        let store = Arc::new(InMemoryTicketStore::new());
        let t1 = test_support::ticket(PaymentStatus::PAID, None);
        let t2 = test_support::ticket(PaymentStatus::PAID, Some("abc"));
        let t3 = test_support::ticket(PaymentStatus::PENDING, None);
        for t in [&t1, &t2, &t3] {
            store.insert_ticket(t.clone()).await;
        }

        let report = run_backfill(&issuer(&store)).await;
        assert_eq!(
            report,
            BackfillReport {
                success: true,
                fixed_count: 1,
                errors: None,
            }
        );

        let fixed = store.ticket(t1.id).await.unwrap();
        assert!(fixed.qr_token.as_deref().is_some_and(|t| !t.is_empty()));
        assert_eq!(fixed.qr_code_data.unwrap().0.id, t1.id);
        assert_eq!(store.ticket(t2.id).await.unwrap().qr_token.as_deref(), Some("abc"));
        assert!(store.ticket(t3.id).await.unwrap().qr_token.is_none());
    }

    #[tokio::test]
    async fn test_second_sweep_changes_nothing() {
        let store = Arc::new(InMemoryTicketStore::new());
        store.insert_ticket(test_support::paid_ticket()).await;
        store.insert_ticket(test_support::ticket(PaymentStatus::PAID, Some(""))).await;
        store
            .insert_subscription(test_support::subscription(PaymentStatus::PAID, None))
            .await;
        let issuer = issuer(&store);

        assert_eq!(run_backfill(&issuer).await.fixed_count, 3);
        let before: Vec<_> = store.tickets().await.into_iter().map(|t| t.qr_token).collect();

        let second = run_backfill(&issuer).await;
        assert!(second.success);
        assert_eq!(second.fixed_count, 0);
        assert!(second.errors.is_none());
        let after: Vec<_> = store.tickets().await.into_iter().map(|t| t.qr_token).collect();
        assert_eq!(before.len(), after.len());
        for token in &before {
            assert!(after.contains(token));
        }
    }

    #[tokio::test]
    async fn test_failed_item_does_not_stop_sweep() {
        let store = Arc::new(InMemoryTicketStore::new());
        let broken = test_support::paid_ticket();
        let healthy = test_support::paid_ticket();
        store.insert_ticket(broken.clone()).await;
        store.insert_ticket(healthy.clone()).await;
        store.fail_writes_for(broken.id).await;

        let report = run_backfill(&issuer(&store)).await;

        assert!(report.success);
        assert_eq!(report.fixed_count, 1);
        let errors = report.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with(&format!("{}: ", broken.id)));
        assert!(store.ticket(healthy.id).await.unwrap().qr_token.is_some());
        assert!(store.ticket(broken.id).await.unwrap().qr_token.is_none());
    }

    #[tokio::test]
    async fn test_selection_failure_reports_unsuccessful() {
        let store = Arc::new(InMemoryTicketStore::new());
        store.insert_ticket(test_support::paid_ticket()).await;
        store.fail_listing(true);

        let report = run_backfill(&issuer(&store)).await;
        assert!(!report.success);
        assert_eq!(report.fixed_count, 0);
    }

    #[test]
    fn test_report_omits_empty_errors() {
        let report = BackfillReport {
            success: true,
            fixed_count: 2,
            errors: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "fixed_count": 2 }));
    }
}
