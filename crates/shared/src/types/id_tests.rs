use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = CompanyId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = InstrumentId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = CustodianId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = CompanyId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(CompanyId::from_str("invalid").is_err());
}

#[test]
fn test_serial_id_ordering() {
    assert!(TransactionId(1) < TransactionId(2));
    assert_eq!(TransactionId::from(7).value(), 7);
}

#[test]
fn test_serial_id_round_trip_text() {
    let id = TransactionId::from_str("42").unwrap();
    assert_eq!(id, TransactionId(42));
    assert_eq!(id.to_string(), "42");
    assert!(LedgerEntryId::from_str("x").is_err());
}

#[test]
fn test_serial_id_serializes_transparently() {
    let json = serde_json::to_string(&TransactionId(5)).unwrap();
    assert_eq!(json, "5");
}
