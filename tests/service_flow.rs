use rust_decimal_macros::dec;

use medtrans_rates::access::Role;
use medtrans_rates::audit::AuditAction;
use medtrans_rates::config::AppConfig;
use medtrans_rates::pricing::{RateService, RateTable, RateType, ServiceType, TripRequest, TripType};
use medtrans_rates::store::FileStore;

fn open(dir: &std::path::Path) -> RateService<FileStore> {
    let config = AppConfig {
        data_dir: dir.to_path_buf(),
        ..AppConfig::default()
    };
    let store = FileStore::open(&config.data_dir).unwrap();
    RateService::new(store, &config)
}

fn twelve_mile_trip() -> TripRequest {
    TripRequest::new(
        ServiceType::Ambulatory,
        RateType::Regular,
        TripType::OneWay,
        dec!(12),
    )
}

#[test]
fn test_desk_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut desk = open(dir.path());
        // 25 base + 20 billed miles * 2.50 + 10 one-way fee
        assert_eq!(desk.quote(&twelve_mile_trip()).unwrap().total, dec!(85));

        let mut table = RateTable::default();
        table.mileage_rates.regular.ambulatory = dec!(3.00);
        desk.update_rates(table).unwrap();
        assert_eq!(desk.quote(&twelve_mile_trip()).unwrap().total, dec!(95));

        desk.switch_user(3).unwrap();
    }

    let mut desk = open(dir.path());
    let agent = desk.current_user().unwrap();
    assert_eq!(agent.name, "Mike Davis");
    assert_eq!(agent.role, Role::Agent);

    // Saved rates are picked up by a fresh cache
    assert_eq!(desk.quote(&twelve_mile_trip()).unwrap().total, dec!(95));
    assert!(desk.rates().unwrap_err().is_denial());
    assert!(desk.audit_entries(10).unwrap_err().is_denial());

    desk.switch_user(1).unwrap();
    let actions: Vec<AuditAction> = desk
        .audit_entries(10)
        .unwrap()
        .iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::UserSwitch,
            AuditAction::RateCalculation,
            AuditAction::UserSwitch,
            AuditAction::RateCalculation,
            AuditAction::RatesUpdated,
            AuditAction::RateCalculation,
        ]
    );
}

#[test]
fn test_reset_rates_clears_saved_table() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut desk = open(dir.path());
        desk.update_rates(RateTable::empty()).unwrap();
        assert_eq!(desk.quote(&twelve_mile_trip()).unwrap().total, dec!(0));
        desk.reset_rates().unwrap();
    }

    let mut desk = open(dir.path());
    assert_eq!(*desk.rates().unwrap(), RateTable::default());
    assert_eq!(desk.quote(&twelve_mile_trip()).unwrap().total, dec!(85));
}

#[test]
fn test_trip_request_from_form_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut desk = open(dir.path());

    let request: TripRequest = serde_json::from_str(
        r#"{
            "serviceType": "wheelchair",
            "rateType": "regular",
            "tripType": "roundtrip",
            "miles": "8",
            "addOns": { "rampFee": true }
        }"#,
    )
    .unwrap();

    let breakdown = desk.quote(&request).unwrap();
    assert_eq!(breakdown.breakdown.trip_multiplier, 2);
    assert_eq!(breakdown.base_fare, dec!(60));
    assert!(breakdown.total > dec!(0));
}
