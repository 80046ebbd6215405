//! End-to-end booking flows over a real catalog file.
//!
//! Run with: `cargo test --test reservation_flow`

use std::fs;
use std::path::Path;

use fake::{faker::name::en::Name, Fake};
use proptest::prelude::*;
use tempfile::TempDir;

use seat_booking::{
    catalog::{CorruptRecordPolicy, EventStore},
    config::Config,
    error::{ReservationError, ValidationError},
    models::{Event, SeatingLayout},
    reservation_log::ReservationLog,
    services::{LogOutcome, ReservationService, SessionStage},
    AppState,
};

fn service_in(dir: &Path, catalog: &str) -> ReservationService {
    let catalog_path = dir.join("events_data.txt");
    fs::write(&catalog_path, catalog).unwrap();
    ReservationService::new(
        EventStore::new(catalog_path, SeatingLayout::standard(), CorruptRecordPolicy::Abort),
        ReservationLog::new(dir.join("reservations.jsonl")),
    )
}

#[test]
fn concert_vip_booking_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_in(dir.path(), "Concert|20|50|\n");

    let concert = service.find_event("Concert").unwrap();
    let reservation = service.select_event(&concert);
    let reservation = service.select_seat(&concert, &reservation, "VIP1").unwrap();
    assert_eq!(reservation.total_cost(), Some(50.0));
    assert_eq!(reservation.ticket_type().as_deref(), Some("VIP"));

    let result = service.confirm(&reservation, "Alice").unwrap();
    assert_eq!(result.reservation.customer_name, "Alice");
    assert_eq!(result.reservation.seat, "VIP1");
    assert_eq!(result.log_outcome, LogOutcome::Recorded);

    let reloaded = service.find_event("Concert").unwrap();
    assert!(reloaded.is_reserved("VIP1"));

    let again = service.select_event(&reloaded);
    let err = service.select_seat(&reloaded, &again, "VIP1").unwrap_err();
    assert!(matches!(err, ReservationError::SeatUnavailable { .. }));
}

#[test]
fn successive_customers_fill_distinct_seats() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_in(dir.path(), "Concert|20|50|\nPlay|10|30|A1\n");

    let seats = ["A2", "B3", "VIP7"];
    let mut customers = Vec::new();
    for seat in seats {
        let customer: String = Name().fake();
        let event = service.find_event("Play").unwrap();
        let reservation = service.select_event(&event);
        let reservation = service.select_seat(&event, &reservation, seat).unwrap();
        service.confirm(&reservation, &customer).unwrap();
        customers.push(customer);
    }

    let play = service.find_event("Play").unwrap();
    assert_eq!(
        play.reserved_seats.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["A1", "A2", "B3", "VIP7"]
    );
    // The other event is untouched.
    assert_eq!(service.find_event("Concert").unwrap(), Event::new("Concert", 20.0, 50.0));

    let logged: Vec<String> = service
        .list_committed()
        .unwrap()
        .into_iter()
        .map(|r| r.customer_name)
        .collect();
    assert_eq!(logged, customers);
}

#[test]
fn confirming_the_same_reservation_twice_fails_the_second_time() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_in(dir.path(), "Concert|20|50|\n");

    let concert = service.find_event("Concert").unwrap();
    let reservation = service.select_event(&concert);
    let reservation = service.select_seat(&concert, &reservation, "C1").unwrap();

    service.confirm(&reservation, "Alice").unwrap();
    let err = service.confirm(&reservation, "Alice").unwrap_err();
    assert!(matches!(err, ReservationError::Validation(ValidationError::StaleReservation)));
    // Nor can it be pointed at another seat and committed again.
    let reloaded = service.find_event("Concert").unwrap();
    assert!(service.select_seat(&reloaded, &reservation, "C2").is_err());
    assert_eq!(service.list_committed().unwrap().len(), 1);
    assert_eq!(fs::read_to_string(dir.path().join("events_data.txt")).unwrap(), "Concert|20|50|C1\n");
}

#[test]
fn cancel_after_commit_keeps_the_seat() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_in(dir.path(), "Concert|20|50|\n");

    let concert = service.find_event("Concert").unwrap();
    let reservation = service.select_event(&concert);
    let reservation = service.select_seat(&concert, &reservation, "D4").unwrap();
    service.confirm(&reservation, "Alice").unwrap();
    assert_eq!(service.stage(), SessionStage::Confirmed);

    service.cancel();
    assert_eq!(service.stage(), SessionStage::Empty);
    assert!(service.find_event("Concert").unwrap().is_reserved("D4"));
}

#[test]
fn app_state_wires_paths_from_config() {
    let dir: TempDir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.txt");
    let log = dir.path().join("audit").join("log.jsonl");
    fs::write(&catalog, "Gala|100|250|\n").unwrap();

    let catalog_str = catalog.to_string_lossy().into_owned();
    let log_str = log.to_string_lossy().into_owned();
    let config = Config::from_lookup(|key| match key {
        "CATALOG_PATH" => Some(catalog_str.clone()),
        "RESERVATION_LOG_PATH" => Some(log_str.clone()),
        _ => None,
    })
    .unwrap();

    let mut state = AppState::new(config);
    let gala = state.service.find_event("Gala").unwrap();
    let reservation = state.service.select_event(&gala);
    let reservation = state.service.select_seat(&gala, &reservation, "A8").unwrap();
    state.service.confirm(&reservation, "Carol").unwrap();

    assert!(log.exists());
    assert!(fs::read_to_string(&catalog).unwrap().starts_with("Gala|100|250|A8"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reserved_seats_are_never_selectable(
        reserved in proptest::sample::subsequence(
            SeatingLayout::standard().seats().map(String::from).collect::<Vec<_>>(),
            1..12,
        ),
        pick in any::<proptest::sample::Index>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = format!("Concert|20|50|{}\n", reserved.join(","));
        let mut service = service_in(dir.path(), &catalog);

        let seat = pick.get(&reserved);
        let concert = service.find_event("Concert").unwrap();
        let reservation = service.select_event(&concert);

        let err = service.select_seat(&concert, &reservation, seat).unwrap_err();
        let is_unavailable = matches!(err, ReservationError::SeatUnavailable { .. });
        prop_assert!(is_unavailable);
    }

    #[test]
    fn blank_names_leave_catalog_untouched(name in "[ \t]{0,6}", idx in 0usize..48) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = "Concert|20|50|\n";
        let mut service = service_in(dir.path(), catalog);

        let seat = SeatingLayout::standard().seats().nth(idx).unwrap().to_string();
        let concert = service.find_event("Concert").unwrap();
        let reservation = service.select_event(&concert);
        let reservation = service.select_seat(&concert, &reservation, &seat).unwrap();

        let err = service.confirm(&reservation, &name).unwrap_err();
        let is_validation = matches!(err, ReservationError::Validation(_));
        prop_assert!(is_validation);
        prop_assert_eq!(fs::read_to_string(dir.path().join("events_data.txt")).unwrap(), catalog);
        prop_assert!(service.list_committed().unwrap().is_empty());
    }
}
