use std::{fs, sync::Arc};

use chrono::NaiveDate;
use servicelog::{
    Category, ContactDraft, FileStore, LogReminders, ServiceBook, ServiceDate, ServiceDraft,
    ServiceFilter, ServiceLogError, ServicePatch, Storage,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(item: &str, date: &str, cost: &str) -> ServiceDraft {
    ServiceDraft {
        category: Category::HomeAppliances,
        item_name: item.to_string(),
        repair_type: "Annual service".to_string(),
        date: ServiceDate::parse(date).unwrap(),
        cost: cost.to_string(),
        note: None,
        image: None,
    }
}

#[tokio::test]
async fn records_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let today = ymd(2025, 1, 25);

    let created = {
        let book = ServiceBook::new(
            Storage::open(dir.path()).unwrap(),
            Arc::new(LogReminders::new()),
            9,
        );
        let furnace = book
            .add_service(draft("Furnace", "01 - 15 - 2025", "100"), false, today)
            .await
            .unwrap();
        book.add_service(draft("Fridge", "01 - 20 - 2025", "50"), false, today)
            .await
            .unwrap();
        book.add_service(draft("Washer", "02 - 01 - 2025", "9999"), true, today)
            .await
            .unwrap();
        book.add_contact(ContactDraft {
            name: "Heating Co".to_string(),
            phone: "555-0110".to_string(),
            specialty: Some("HVAC".to_string()),
            email: None,
            address: None,
        })
        .await
        .unwrap();
        furnace
    };

    let reopened = ServiceBook::new(
        Storage::open(dir.path()).unwrap(),
        Arc::new(LogReminders::new()),
        9,
    );
    let dashboard = reopened.dashboard(today).await.unwrap();
    assert_eq!(dashboard.monthly_total, 150.0);
    assert_eq!(dashboard.partition.upcoming.len(), 1);
    assert!(dashboard.partition.upcoming[0].reminder_id.is_some());
    assert_eq!(dashboard.partition.history[0].item_name, "Fridge");
    assert_eq!(dashboard.partition.history[1], created);

    let updated = reopened
        .edit_service(
            &created.id,
            ServicePatch {
                cost: Some("500".to_string()),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(updated.cost, "500");
    assert_eq!(updated.item_name, "Furnace");

    let groups = reopened.contacts(&Default::default()).await.unwrap();
    assert_eq!(groups[0].key, "H");
}

#[tokio::test]
async fn stored_layout_is_a_json_array_per_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::open(dir.path()).unwrap();
    storage
        .services
        .create(draft("Dishwasher", "03 - 04 - 2025", "75.50"))
        .await
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("service_records.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value.as_array().unwrap()[0];
    assert_eq!(entry["itemName"], "Dishwasher");
    assert_eq!(entry["category"], "home_appliances");
    assert_eq!(entry["date"], "03 - 04 - 2025");
    assert_eq!(entry["cost"], "75.50");
    assert!(entry["reminderId"].is_null());
    assert!(!dir.path().join("contacts.json").exists());
}

#[tokio::test]
async fn hand_edited_data_is_read_back() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("service_records.json"),
        r#"[
            {"id":"1736700000000","category":"garden","itemName":"Mower","repairType":"Blades",
             "date":"06 - 01 - 2025","cost":"30","reminderId":null,"createdAt":"2025-01-12T16:40:00.000Z"},
            {"id":"1736700000001","category":"vehicles","itemName":"Bike","repairType":"Chain",
             "date":"June 1st","cost":"12","reminderId":null,"createdAt":"2025-01-12T16:41:00.000Z"}
        ]"#,
    )
    .unwrap();

    let storage = Storage::new(Arc::new(FileStore::open(dir.path()).unwrap()));
    let records = storage.services.list().await.unwrap();
    assert_eq!(records[0].category, Category::Unknown("garden".to_string()));

    let view = servicelog::partition(&records, ymd(2025, 7, 1));
    assert_eq!(view.history.len(), 1);
    assert_eq!(view.invalid.len(), 1);
    assert_eq!(view.invalid[0].id, "1736700000001");

    let filter = ServiceFilter {
        search: Some("bike".to_string()),
        ..Default::default()
    };
    assert_eq!(filter.apply(&records, ymd(2025, 7, 1)).len(), 1);

    // Unknown categories survive a rewrite.
    storage.services.delete("1736700000001").await.unwrap();
    let raw = fs::read_to_string(dir.path().join("service_records.json")).unwrap();
    assert!(raw.contains("\"garden\""));
}

#[tokio::test]
async fn corrupt_file_is_reported_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    fs::write(&path, "not json at all").unwrap();

    let storage = Storage::open(dir.path()).unwrap();
    let snapshot = storage.contacts.snapshot().await.unwrap();
    assert!(snapshot.records.is_empty());
    assert!(snapshot.is_corrupt());

    let result = storage
        .contacts
        .create(ContactDraft {
            name: "Someone".to_string(),
            phone: "1".to_string(),
            specialty: None,
            email: None,
            address: None,
        })
        .await;
    assert!(matches!(result, Err(ServiceLogError::StorageRead { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), "not json at all");

    storage.reset_all().await.unwrap();
    assert!(!path.exists());
}
