//! Custodian consistency checks against a real database.

mod common;

use common::{buy, day, group, group_of, sell, services, setup_db};
use kardex_core::kardex::{ConsistencyStatus, ExternalBalance, GroupKey};
use kardex_db::{CostingError, CustodianBalanceRepository, TransactionRepository};
use kardex_db::services::KardexServices;
use kardex_shared::types::CompanyId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

async fn costed_group(db: &DatabaseConnection, svc: &KardexServices, g: &GroupKey) {
    let txs = TransactionRepository::new(db.clone());
    buy(&txs, g, day(1), dec!(100), dec!(10)).await;
    sell(&txs, g, day(5), dec!(60)).await;
    svc.costing.run_all().await.unwrap();
}

fn statement(g: &GroupKey, date: u32, quantity: Decimal) -> ExternalBalance {
    ExternalBalance {
        group: g.clone(),
        statement_date: day(date),
        quantity,
    }
}

#[tokio::test]
async fn test_check_matches_statement() {
    let db = setup_db().await;
    let svc = services(&db);
    let g = group("OK");
    costed_group(&db, &svc, &g).await;
    CustodianBalanceRepository::new(db.clone())
        .record(&statement(&g, 10, dec!(40)))
        .await
        .unwrap();

    let report = svc.consistency.check(&g).await.unwrap();
    assert_eq!(report.status, ConsistencyStatus::Match);
    assert_eq!(report.engine_quantity, dec!(40));
    assert_eq!(report.engine_as_of, Some(day(5)));
    assert_eq!(report.difference, Decimal::ZERO);
}

#[tokio::test]
async fn test_check_reports_mismatch() {
    let db = setup_db().await;
    let svc = services(&db);
    let g = group("DIFF");
    costed_group(&db, &svc, &g).await;
    let statements = CustodianBalanceRepository::new(db.clone());
    statements.record(&statement(&g, 8, dec!(40))).await.unwrap();
    statements.record(&statement(&g, 10, dec!(45))).await.unwrap();

    let report = svc.consistency.check(&g).await.unwrap();
    assert!(!report.is_match());
    assert_eq!(report.statement_date, day(10));
    assert_eq!(report.external_quantity, dec!(45));
    assert_eq!(report.difference, dec!(-5));
}

#[tokio::test]
async fn test_statement_before_cache_uses_kardex_row() {
    let db = setup_db().await;
    let svc = services(&db);
    let g = group("PAST");
    costed_group(&db, &svc, &g).await;
    CustodianBalanceRepository::new(db.clone())
        .record(&statement(&g, 3, dec!(100)))
        .await
        .unwrap();

    let report = svc.consistency.check(&g).await.unwrap();
    assert!(report.is_match());
    assert_eq!(report.engine_quantity, dec!(100));
    assert_eq!(report.engine_as_of, Some(day(1)));
}

#[tokio::test]
async fn test_check_without_statement_is_not_found() {
    let db = setup_db().await;
    let svc = services(&db);
    let g = group("NONE");
    costed_group(&db, &svc, &g).await;

    let err = svc.consistency.check(&g).await.unwrap_err();
    assert!(matches!(err, CostingError::StatementNotFound(_)));
}

#[tokio::test]
async fn test_check_company_covers_groups_with_statements() {
    let db = setup_db().await;
    let svc = services(&db);
    let company = CompanyId::new();
    let reported = group_of(company, "R");
    let silent = group_of(company, "S");
    let other = group("OTHER");
    for g in [&reported, &silent, &other] {
        costed_group(&db, &svc, g).await;
    }

    let statements = CustodianBalanceRepository::new(db.clone());
    statements.record(&statement(&reported, 10, dec!(40))).await.unwrap();
    statements.record(&statement(&other, 10, dec!(1))).await.unwrap();

    let reports = svc.consistency.check_company(company).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].group, reported);
    assert!(reports[0].is_match());
}
