mod common;

use anyhow::Result;
use busango::domain::{Currency, ExchangeRate};
use busango::io::{Exporter, TripSnapshot};
use common::{spend, test_service};

#[tokio::test]
async fn test_export_expenses_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    spend(&service, "Seafood dinner", 90_000.0, Currency::Krw, "2", &[]).await?;
    spend(&service, "Coffee", 150.0, Currency::Twd, "1", &["1", "3"]).await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_expenses_csv(&mut buffer)
        .await?;
    assert_eq!(count, 2);

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][2], "Seafood dinner");
    assert_eq!(&rows[0][4], "KRW");
    assert_eq!(&rows[0][5], "Alice");
    assert_eq!(&rows[0][6], "You;Alice;Bob");
    assert_eq!(&rows[1][6], "You;Bob");

    Ok(())
}

#[tokio::test]
async fn test_export_balances_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    spend(&service, "Dinner", 10_000.0, Currency::Krw, "1", &[]).await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_balances_csv(&mut buffer)
        .await?;
    assert_eq!(count, 3);

    let text = String::from_utf8(buffer)?;
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "participant,currency,balance");
    assert_eq!(lines[1], "You,TWD,160.00");
    assert_eq!(lines[2], "Alice,TWD,-80.00");

    Ok(())
}

#[tokio::test]
async fn test_export_full_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    spend(&service, "Dinner", 10_000.0, Currency::Krw, "1", &[]).await?;

    let mut buffer = Vec::new();
    Exporter::new(&service).export_full_json(&mut buffer).await?;

    let snapshot: TripSnapshot = serde_json::from_slice(&buffer)?;
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.krw_to_twd, ExchangeRate::default());
    assert_eq!(snapshot.participants.len(), 3);
    assert_eq!(snapshot.expenses.len(), 1);
    assert_eq!(snapshot.itinerary.len(), 2);
    assert_eq!(snapshot.bookings.len(), 2);
    assert_eq!(snapshot.summary.settlement.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_with_zero_rate_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut buffer = Vec::new();
    Exporter::new(&service).export_full_json(&mut buffer).await?;

    let mut value: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(value["krw_to_twd"], 0.024);
    value["krw_to_twd"] = serde_json::json!(0.0);

    // A zero rate would turn every TWD amount into infinite KRW
    assert!(serde_json::from_value::<TripSnapshot>(value).is_err());

    Ok(())
}
