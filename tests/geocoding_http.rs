use std::time::Duration;

use httpmock::prelude::*;
use seekart_lib::debounce::{Debounced, Debouncer};
use seekart_lib::geocoding::{AddressResolver, GeocodingClient, GeocodingError, ReverseAddress};
use seekart_lib::models::{Address, Coordinates};

const PLACES: &str = r"^/geocoding/v5/mapbox\.places/[^/]+\.json$";

const ONE_FEATURE: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "id": "address.42",
        "center": [-58.3816, -34.6037],
        "relevance": 0.93,
        "text": "Avenida Corrientes",
        "address": "1234",
        "context": [
            {"id": "neighborhood.1", "text": "San Nicolás"},
            {"id": "place.2", "text": "Buenos Aires"},
            {"id": "region.3", "text": "Ciudad Autónoma de Buenos Aires"},
            {"id": "country.4", "text": "Argentina"}
        ]
    }]
}"#;

fn corrientes() -> Address {
    Address {
        address: "Av. Corrientes 1234".into(),
        city: "Buenos Aires".into(),
        country: "Argentina".into(),
        ..Address::default()
    }
}

fn client(server: &MockServer) -> GeocodingClient {
    GeocodingClient::new(&server.base_url(), "pk.test").unwrap()
}

#[tokio::test]
async fn forward_lookup_returns_first_feature() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path_matches(PLACES)
            .query_param("access_token", "pk.test")
            .query_param("limit", "1")
            .query_param("types", "address")
            .query_param("autocomplete", "false");
        then.status(200)
            .header("content-type", "application/json")
            .body(ONE_FEATURE);
    });

    let result = client(&server).resolve(&corrientes()).await.unwrap();
    mock.assert();
    assert_eq!(result.latitude, -34.6037);
    assert_eq!(result.longitude, -58.3816);
    assert_eq!(result.precision, 0.93);
}

#[tokio::test]
async fn server_errors_collapse_to_no_result() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path_matches(PLACES);
        then.status(500).body("upstream down");
    });

    let geocoder = client(&server);
    assert_eq!(geocoder.resolve(&corrientes()).await, None);
    let err = geocoder.lookup("Av. Corrientes 1234").await.unwrap_err();
    assert!(matches!(err, GeocodingError::Status { status: 500, .. }));
    mock.assert_calls(2);
}

#[tokio::test]
async fn malformed_and_empty_payloads_give_no_result() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_matches(PLACES).query_param("types", "address");
        then.status(200).body("{\"features\": \"nope\"}");
    });
    let geocoder = client(&server);
    assert_eq!(geocoder.resolve(&corrientes()).await, None);

    let empty = MockServer::start();
    empty.mock(|when, then| {
        when.method(GET).path_matches(PLACES);
        then.status(200).body(r#"{"type":"FeatureCollection","features":[]}"#);
    });
    assert_eq!(client(&empty).lookup("nowhere").await.unwrap(), None);
}

#[tokio::test]
async fn blank_address_makes_no_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path_matches(PLACES);
        then.status(200).body(ONE_FEATURE);
    });

    let blank = Address {
        city: "  ".into(),
        ..Address::default()
    };
    assert_eq!(client(&server).resolve(&blank).await, None);
    mock.assert_calls(0);
}

#[tokio::test]
async fn reverse_lookup_maps_context() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path_matches(r"^/geocoding/v5/mapbox\.places/-58\.3816,-34\.6037\.json$")
            .query_param("types", "address");
        then.status(200).body(ONE_FEATURE);
    });

    let at = Coordinates::new(-34.6037, -58.3816).unwrap();
    let found = client(&server).reverse(at).await;
    mock.assert();
    assert_eq!(
        found,
        Some(ReverseAddress {
            address: Some("Avenida Corrientes 1234".into()),
            city: Some("Buenos Aires".into()),
            state: Some("Ciudad Autónoma de Buenos Aires".into()),
            country: Some("Argentina".into()),
            locality: Some("San Nicolás".into()),
        })
    );
}

#[tokio::test]
async fn resolver_only_answers_the_latest_edit() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path_matches(PLACES);
        then.status(200).body(ONE_FEATURE);
    });

    let resolver = AddressResolver::new(
        client(&server),
        Debouncer::new(Duration::from_millis(50)),
    );
    let mut first_edit = corrientes();
    first_edit.address = "Av. Corr".into();

    let (first, second) = tokio::join!(resolver.resolve(first_edit), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        resolver.resolve(corrientes()).await
    });

    assert_eq!(first, Debounced::Superseded);
    assert!(matches!(second, Debounced::Fresh(Some(_))));
    mock.assert_calls(1);
}
