use std::time::Duration;

use httpmock::prelude::*;
use seekart_lib::debounce::Debouncer;
use seekart_lib::error::Notice;
use seekart_lib::event_form::{EventDraft, EventForm, LOCATION_NOT_UPDATED};
use seekart_lib::geocoding::{AddressResolver, GeocodingClient};
use seekart_lib::models::Coordinates;
use seekart_lib::picker::{Interaction, ViewTransition};

const PLACES: &str = r"^/geocoding/v5/mapbox\.places/[^/]+\.json$";

const TEATRO_COLON: &str = r#"{
    "features": [{
        "center": [-58.3831, -34.6011],
        "relevance": 0.88,
        "text": "Cerrito",
        "address": "628",
        "context": [
            {"id": "neighborhood.1", "text": "San Nicolás"},
            {"id": "place.2", "text": "Buenos Aires"},
            {"id": "country.3", "text": "Argentina"}
        ]
    }]
}"#;

fn resolver(server: &MockServer) -> AddressResolver {
    AddressResolver::new(
        GeocodingClient::new(&server.base_url(), "pk.test").unwrap(),
        Debouncer::new(Duration::from_millis(50)),
    )
}

fn draft_at(address: &str) -> EventDraft {
    let mut draft = EventDraft::default();
    draft.address.address = address.into();
    draft.address.city = "Buenos Aires".into();
    draft
}

#[tokio::test]
async fn fresh_lookup_moves_draft_and_picker() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_matches(PLACES).query_param("types", "address");
        then.status(200).body(TEATRO_COLON);
    });

    let mut form = EventForm::from_draft(draft_at("Cerrito 628"));
    let update = form.relocate(&resolver(&server)).await.unwrap();

    let expected = Coordinates::new(-34.6011, -58.3831).unwrap();
    assert_eq!(update.notice, None);
    assert_eq!(update.precision, Some(0.88));
    assert!(matches!(update.transition, ViewTransition::FlyTo { center, .. } if center == expected));
    assert_eq!(form.picker().position(), Some(expected));
    assert_eq!(form.draft().latitude, Some(-34.6011));
    assert_eq!(form.draft().longitude, Some(-58.3831));
}

#[tokio::test]
async fn superseded_edit_yields_nothing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path_matches(PLACES);
        then.status(200).body(TEATRO_COLON);
    });
    let resolver = resolver(&server);

    let mut early = EventForm::from_draft(draft_at("Cerr"));
    let mut late = EventForm::from_draft(draft_at("Cerrito 628"));
    let (early_update, late_update) = tokio::join!(early.relocate(&resolver), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        late.relocate(&resolver).await
    });

    assert_eq!(early_update, None);
    assert_eq!(early.draft().latitude, None);
    assert_eq!(early.picker().position(), None);
    assert!(late_update.is_some());
    assert_eq!(late.draft().latitude, Some(-34.6011));
    mock.assert_calls(1);
}

#[tokio::test]
async fn lookup_miss_keeps_coordinates_and_warns() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_matches(PLACES);
        then.status(200).body(r#"{"features": []}"#);
    });

    let mut draft = draft_at("Nowhere 1");
    draft.latitude = Some(-34.5);
    draft.longitude = Some(-58.4);
    let mut form = EventForm::from_draft(draft);
    let update = form.relocate(&resolver(&server)).await.unwrap();

    assert_eq!(update.transition, ViewTransition::Stay);
    assert_eq!(update.notice, Some(Notice::warning(LOCATION_NOT_UPDATED)));
    assert_eq!(form.draft().latitude, Some(-34.5));
    assert_eq!(form.picker().position(), Coordinates::new(-34.5, -58.4).ok());
}

#[tokio::test]
async fn pick_fills_the_address_from_the_reverse_lookup() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path_matches(r"^/geocoding/v5/mapbox\.places/-58\.3831,-34\.6011\.json$");
        then.status(200).body(TEATRO_COLON);
    });
    let geocoder = GeocodingClient::new(&server.base_url(), "pk.test").unwrap();

    let mut form = EventForm::from_draft(draft_at("old street"));
    let at = Coordinates::new(-34.6011, -58.3831).unwrap();
    let notice = form.pick(Interaction::DragEnd(at), &geocoder).await;

    mock.assert();
    assert_eq!(notice, None);
    assert_eq!(form.picker().position(), Some(at));
    assert_eq!(form.draft().address.address, "Cerrito 628");
    assert_eq!(form.draft().address.locality, "San Nicolás");
    assert_eq!(form.draft().latitude, Some(-34.6011));
}

#[tokio::test]
async fn reverse_miss_returns_the_location_notice() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_matches(PLACES);
        then.status(503).body("busy");
    });
    let geocoder = GeocodingClient::new(&server.base_url(), "pk.test").unwrap();

    let mut form = EventForm::from_draft(draft_at("Defensa 500"));
    let at = Coordinates::new(-34.61, -58.37).unwrap();
    let notice = form.pick(Interaction::Click(at), &geocoder).await;

    assert_eq!(notice, Some(Notice::warning(LOCATION_NOT_UPDATED)));
    assert_eq!(form.draft().address.address, "Defensa 500");
    assert_eq!(form.draft().latitude, Some(-34.61));
    assert_eq!(form.draft().longitude, Some(-58.37));
}
