use serde_json::json;
use std::cell::Cell;
use worldwide_core::{
    seed_cities, CityRepository, DocumentCityRepository, Gateway, GatewayConfig, NewCity,
    Position, SeedFixture, SeedOutcome,
};

fn fixture() -> SeedFixture {
    SeedFixture::from_json_str(
        &json!({
            "cities": [
                {
                    "id": 73930385,
                    "cityName": "Lisbon",
                    "country": "Portugal",
                    "emoji": "PT",
                    "date": "2027-10-31T15:59:59.138Z",
                    "notes": "My favorite city so far!",
                    "position": {"lat": 38.727881642324164, "lng": -9.140900099907554}
                },
                {
                    "cityName": "Madrid",
                    "country": "Spain",
                    "date": "2027-07-15T08:22:53.976Z",
                    "position": {"lat": 40.46635901755316, "lng": -3.7133789062500004}
                }
            ]
        })
        .to_string(),
    )
    .unwrap()
}

#[test]
fn seeds_empty_collection_without_asking() {
    let mut gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));
    let repo = DocumentCityRepository::new(&gateway.connect().unwrap());

    let outcome = seed_cities(&repo, &fixture(), |_| {
        panic!("confirmation must not be requested for an empty collection")
    })
    .unwrap();

    let SeedOutcome::Completed { cleared, report } = outcome else {
        panic!("expected completed seed run");
    };
    assert_eq!(cleared, 0);
    assert_eq!(report.succeeded.len(), 2);
    assert!(report.failed.is_empty());
    assert_eq!(repo.count_cities().unwrap(), 2);
    assert!(report
        .succeeded
        .iter()
        .all(|city| city.created_at == city.updated_at));
    assert_eq!(report.succeeded[0].notes, "My favorite city so far!");
    assert_eq!(report.succeeded[1].notes, "");
}

#[test]
fn bad_records_are_reported_and_do_not_abort_the_batch() {
    let mut gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));
    let repo = DocumentCityRepository::new(&gateway.connect().unwrap());
    let fixture = SeedFixture::from_json_str(
        &json!({
            "cities": [
                {"cityName": "Nowhere", "country": "Atlantis"},
                "not an object",
                {"cityName": "Berlin", "country": "Germany", "position": {"lat": 52.5, "lng": 13.4}}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let outcome = seed_cities(&repo, &fixture, |_| Ok(true)).unwrap();

    let SeedOutcome::Completed { report, .. } = outcome else {
        panic!("expected completed seed run");
    };
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].city_name, "Berlin");
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].reason.contains("position"));
    assert_eq!(report.failed[1].input, json!("not an object"));
    assert_eq!(repo.count_cities().unwrap(), 1);
}

#[test]
fn declined_confirmation_leaves_collection_untouched() {
    let mut gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));
    let repo = DocumentCityRepository::new(&gateway.connect().unwrap());
    let existing = repo
        .create_city(&NewCity::new("Paris", "France", Position::new(48.8, 2.3)))
        .unwrap();
    let asked_with = Cell::new(None);

    let outcome = seed_cities(&repo, &fixture(), |count| {
        asked_with.set(Some(count));
        Ok(false)
    })
    .unwrap();

    assert_eq!(outcome, SeedOutcome::Cancelled { existing: 1 });
    assert_eq!(asked_with.get(), Some(1));
    let cities = repo.list_cities().unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].id, existing.id);
}

#[test]
fn confirmed_reimport_clears_existing_cities_first() {
    let mut gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));
    let repo = DocumentCityRepository::new(&gateway.connect().unwrap());
    repo.create_city(&NewCity::new("Paris", "France", Position::new(48.8, 2.3)))
        .unwrap();

    let outcome = seed_cities(&repo, &fixture(), |_| Ok(true)).unwrap();

    let SeedOutcome::Completed { cleared, report } = outcome else {
        panic!("expected completed seed run");
    };
    assert_eq!(cleared, 1);
    assert_eq!(report.succeeded.len(), 2);
    let names: Vec<_> = repo
        .list_cities()
        .unwrap()
        .into_iter()
        .map(|city| city.city_name)
        .collect();
    assert!(!names.contains(&"Paris".to_string()));
    assert_eq!(names.len(), 2);
}

#[test]
fn prompt_failure_aborts_without_changes() {
    let mut gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));
    let repo = DocumentCityRepository::new(&gateway.connect().unwrap());
    repo.create_city(&NewCity::new("Paris", "France", Position::new(48.8, 2.3)))
        .unwrap();

    let result = seed_cities(&repo, &fixture(), |_| {
        Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stdin closed"))
    });

    assert!(matches!(result, Err(worldwide_core::SeedError::Prompt(_))));
    assert_eq!(repo.count_cities().unwrap(), 1);
}
