mod common;

use anyhow::Result;
use chrono::{Days, Local};
use common::{legacy_service, parse_date, record, test_service, SampleLedger};
use moneylist::application::{AppError, TransactionFilter};
use moneylist::domain::{NewTransaction, TransactionKind};

#[tokio::test]
async fn test_empty_ledger_totals_are_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert_eq!(service.balance().await?, 0);
    assert_eq!(service.total_income().await?, 0);
    assert_eq!(service.total_expense().await?, 0);
    assert!(service.list_transactions(TransactionFilter::default()).await?.is_empty());
    assert!(service.balance_trend().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_salary_and_groceries_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (salary, groceries) = SampleLedger::create_basic(&service).await?;

    assert_eq!(service.balance().await?, 79950);
    assert_eq!(service.total_income().await?, 100000);
    assert_eq!(service.total_expense().await?, 20050);

    let listed = service
        .list_transactions(TransactionFilter::between(
            parse_date("2024-01-01"),
            parse_date("2024-01-05"),
        ))
        .await?;
    let ids: Vec<i64> = listed.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![groceries, salary], "Newest first");
    assert_eq!(listed[0].kind, TransactionKind::Expense);
    assert_eq!(listed[1].kind, TransactionKind::Income);

    Ok(())
}

#[tokio::test]
async fn test_balance_identity() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::create_mixed(&service).await?;

    let income = service.total_income().await?;
    let expense = service.total_expense().await?;
    assert_eq!(service.balance().await?, income - expense);

    let summary = service.summary().await?;
    assert_eq!(summary.total_income, income);
    assert_eq!(summary.total_expense, expense);
    assert_eq!(summary.balance, income - expense);
    assert_eq!(summary.transaction_count, 6);

    Ok(())
}

#[tokio::test]
async fn test_amounts_sum_exactly_in_cents() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // 0.10 + 0.20 drifts in floating point
    record(&service, "2024-01-01", TransactionKind::Income, 10, "").await?;
    record(&service, "2024-01-01", TransactionKind::Income, 20, "").await?;
    record(&service, "2024-01-01", TransactionKind::Expense, 30, "").await?;

    assert_eq!(service.total_income().await?, 30);
    assert_eq!(service.balance().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_date_range_is_inclusive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    record(&service, "2023-12-31", TransactionKind::Income, 100, "before").await?;
    record(&service, "2024-01-01", TransactionKind::Income, 200, "first day").await?;
    record(&service, "2024-01-15", TransactionKind::Expense, 300, "middle").await?;
    record(&service, "2024-01-31", TransactionKind::Expense, 400, "last day").await?;
    record(&service, "2024-02-01", TransactionKind::Income, 500, "after").await?;

    let january = service
        .list_transactions(TransactionFilter::between(
            parse_date("2024-01-01"),
            parse_date("2024-01-31"),
        ))
        .await?;
    let descriptions: Vec<&str> = january.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["last day", "middle", "first day"]);

    let single_day = service
        .list_transactions(TransactionFilter::between(
            parse_date("2024-01-15"),
            parse_date("2024-01-15"),
        ))
        .await?;
    assert_eq!(single_day.len(), 1);

    let inverted = service
        .list_transactions(TransactionFilter::between(
            parse_date("2024-01-31"),
            parse_date("2024-01-01"),
        ))
        .await?;
    assert!(inverted.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_default_range_excludes_future_dates() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let today = Local::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap();

    record(&service, "1970-01-01", TransactionKind::Income, 100, "epoch").await?;
    record(&service, &today.to_string(), TransactionKind::Income, 200, "today").await?;
    record(&service, &tomorrow.to_string(), TransactionKind::Expense, 300, "tomorrow").await?;

    let listed = service.list_transactions(TransactionFilter::default()).await?;
    let descriptions: Vec<&str> = listed.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["today", "epoch"]);

    // Aggregates are never date-filtered
    assert_eq!(service.balance().await?, 0);
    assert_eq!(service.list_all_transactions().await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_default_range_starts_at_epoch() -> Result<()> {
    let (service, _temp) = test_service().await?;

    record(&service, "1969-12-31", TransactionKind::Income, 100, "before epoch").await?;
    record(&service, "1970-01-01", TransactionKind::Income, 200, "epoch").await?;

    let listed = service.list_transactions(TransactionFilter::default()).await?;
    let descriptions: Vec<&str> = listed.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["epoch"]);

    // Still part of the ledger, just outside the default window
    assert_eq!(service.total_income().await?, 300);

    Ok(())
}

#[tokio::test]
async fn test_kind_filter_is_subset() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::create_mixed(&service).await?;

    let range = TransactionFilter::between(parse_date("2024-01-01"), parse_date("2024-12-31"));
    let all = service.list_transactions(range.clone()).await?;
    let income = service
        .list_transactions(range.clone().with_kind(TransactionKind::Income))
        .await?;
    let expense = service
        .list_transactions(range.with_kind(TransactionKind::Expense))
        .await?;

    assert_eq!(income.len(), 2);
    assert_eq!(expense.len(), 4);
    assert!(income.iter().all(|t| t.kind == TransactionKind::Income));
    assert!(expense.iter().all(|t| t.kind == TransactionKind::Expense));
    assert!(income.iter().chain(expense.iter()).all(|t| all.contains(t)));
    assert_eq!(income.len() + expense.len(), all.len());

    Ok(())
}

#[tokio::test]
async fn test_create_then_get_roundtrip() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let fields = NewTransaction::new(
        parse_date("2024-03-08"),
        TransactionKind::Expense,
        123456,
        "花, with a comma",
    )?;
    let id = service.create_transaction(fields.clone()).await?;
    let fetched = service.get_transaction(id).await?;

    assert_eq!(fetched.id, id);
    assert_eq!(fetched.fields(), fields);

    Ok(())
}

#[tokio::test]
async fn test_ids_increase_and_are_not_reused() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let first = record(&service, "2024-01-01", TransactionKind::Income, 100, "").await?;
    let second = record(&service, "2024-01-01", TransactionKind::Income, 100, "").await?;
    assert!(second > first);

    service.delete_transaction(second).await?;
    let third = record(&service, "2024-01-01", TransactionKind::Income, 100, "").await?;
    assert!(third > second, "Deleted ids must not be handed out again");

    Ok(())
}

#[tokio::test]
async fn test_update_replaces_all_fields() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (salary, _) = SampleLedger::create_basic(&service).await?;

    let replacement = NewTransaction::new(
        parse_date("2024-02-29"),
        TransactionKind::Expense,
        999,
        "",
    )?;
    let updated = service.update_transaction(salary, replacement.clone()).await?;
    assert_eq!(updated.id, salary);

    let fetched = service.get_transaction(salary).await?;
    assert_eq!(fetched.fields(), replacement);
    assert_eq!(service.total_income().await?, 0);
    assert_eq!(service.total_expense().await?, 20050 + 999);

    Ok(())
}

#[tokio::test]
async fn test_update_missing_id_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::create_basic(&service).await?;

    let fields = NewTransaction::new(parse_date("2024-01-01"), TransactionKind::Income, 1, "")?;
    let result = service.update_transaction(9999, fields).await;
    assert!(matches!(result, Err(AppError::TransactionNotFound(9999))));
    assert_eq!(service.list_all_transactions().await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_delete_removes_transaction() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (salary, groceries) = SampleLedger::create_basic(&service).await?;

    let deleted = service.delete_transaction(salary).await?;
    assert_eq!(deleted.description, "salary");

    assert!(matches!(
        service.get_transaction(salary).await,
        Err(AppError::TransactionNotFound(id)) if id == salary
    ));
    assert!(service.get_transaction(groceries).await.is_ok());
    assert_eq!(service.balance().await?, -20050);

    assert!(matches!(
        service.delete_transaction(salary).await,
        Err(AppError::TransactionNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_negative_amount_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let fields = NewTransaction {
        date: parse_date("2024-01-01"),
        kind: TransactionKind::Income,
        amount_cents: -100,
        description: String::new(),
    };
    assert!(matches!(
        service.create_transaction(fields).await,
        Err(AppError::Validation(_))
    ));
    assert!(service.list_all_transactions().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_update_rejects_negative_amount() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (salary, _) = SampleLedger::create_basic(&service).await?;
    let before = service.get_transaction(salary).await?;

    let mut fields = before.fields();
    fields.amount_cents = -500;
    assert!(matches!(
        service.update_transaction(salary, fields).await,
        Err(AppError::Validation(_))
    ));

    assert_eq!(service.get_transaction(salary).await?, before);
    assert_eq!(service.balance().await?, 79950);

    Ok(())
}

#[tokio::test]
async fn test_balance_trend_is_chronological() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::create_mixed(&service).await?;

    let trend = service.balance_trend().await?;
    assert_eq!(trend.len(), 6);

    let dates: Vec<String> = trend.iter().map(|p| p.date.to_string()).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    assert_eq!(trend[0].balance, 100000);
    assert_eq!(trend[1].balance, 79950);
    assert_eq!(trend.last().unwrap().balance, service.balance().await?);

    Ok(())
}

#[tokio::test]
async fn test_data_survives_reopen() -> Result<()> {
    let (service, temp) = test_service().await?;
    SampleLedger::create_basic(&service).await?;
    service.close().await;

    let db_path = temp.path().join("test.db");
    let reopened = moneylist::application::LedgerService::init(db_path.to_str().unwrap()).await?;
    assert_eq!(reopened.balance().await?, 79950);
    assert_eq!(reopened.list_all_transactions().await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_legacy_rows_with_bad_values_are_errors() -> Result<()> {
    let (service, _temp) = legacy_service(&[
        "'2024-01-01', '收入', 1000, 'salary'",
        "'2024-01-02', '支出', '', 'blank amount'",
        "'2024-01-03', NULL, 5, 'no type'",
        "NULL, '支出', 5, 'no date'",
    ])
    .await?;

    let salary = service.get_transaction(1).await?;
    assert_eq!(salary.amount_cents, 100000);
    assert_eq!(salary.description, "salary");

    for id in 2..=4 {
        assert!(
            matches!(service.get_transaction(id).await, Err(AppError::Database(_))),
            "row {} should fail to decode",
            id
        );
    }

    let range = TransactionFilter::between(parse_date("2024-01-01"), parse_date("2024-12-31"));
    assert!(matches!(
        service.list_transactions(range).await,
        Err(AppError::Database(_))
    ));
    assert!(matches!(
        service.balance_trend().await,
        Err(AppError::Database(_))
    ));

    // New rows still go through
    let id = record(&service, "2024-02-01", TransactionKind::Income, 100, "").await?;
    assert!(id > 4);

    Ok(())
}
