use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ARTIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/artist/([^/]+)$").expect("valid artist route regex"));
static FAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/fan/([^/]+)$").expect("valid fan route regex"));
static EVENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/events/([^/]+)$").expect("valid event route regex"));
static EDIT_EVENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/events/([^/]+)/edit$").expect("valid edit route regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "id", rename_all = "snake_case")]
pub enum Route {
    Home,
    Auth,
    ArtistProfile(String),
    FanProfile(String),
    Map,
    Events,
    EventDetail(String),
    Artists,
    CreateEvent,
    EditEvent(String),
    Donations,
    SystemCheck,
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        match path {
            "/" => return Route::Home,
            "/auth" => return Route::Auth,
            "/map" => return Route::Map,
            "/events" => return Route::Events,
            "/events/new" => return Route::CreateEvent,
            "/artists" => return Route::Artists,
            "/donations" => return Route::Donations,
            "/system-check" => return Route::SystemCheck,
            _ => {}
        }

        let capture = |re: &Regex| {
            re.captures(path)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };
        if let Some(id) = capture(&EDIT_EVENT_RE) {
            Route::EditEvent(id)
        } else if let Some(id) = capture(&EVENT_RE) {
            Route::EventDetail(id)
        } else if let Some(id) = capture(&ARTIST_RE) {
            Route::ArtistProfile(id)
        } else if let Some(id) = capture(&FAN_RE) {
            Route::FanProfile(id)
        } else {
            Route::NotFound
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Auth => "/auth".to_string(),
            Route::ArtistProfile(id) => format!("/artist/{id}"),
            Route::FanProfile(id) => format!("/fan/{id}"),
            Route::Map => "/map".to_string(),
            Route::Events => "/events".to_string(),
            Route::EventDetail(id) => format!("/events/{id}"),
            Route::Artists => "/artists".to_string(),
            Route::CreateEvent => "/events/new".to_string(),
            Route::EditEvent(id) => format!("/events/{id}/edit"),
            Route::Donations => "/donations".to_string(),
            Route::SystemCheck => "/system-check".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Pages that only make sense with a signed-in artist.
    pub fn needs_artist(&self) -> bool {
        matches!(self, Route::CreateEvent | Route::EditEvent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/map/"), Route::Map);
        assert_eq!(Route::parse("/events?category=music"), Route::Events);
        assert_eq!(Route::parse("/events/new"), Route::CreateEvent);
        assert_eq!(Route::parse("/events/e42"), Route::EventDetail("e42".into()));
        assert_eq!(Route::parse("/events/e42/edit"), Route::EditEvent("e42".into()));
        assert_eq!(Route::parse("/artist/a1"), Route::ArtistProfile("a1".into()));
        assert_eq!(Route::parse("/fan/f1#top"), Route::FanProfile("f1".into()));
        assert_eq!(Route::parse("/system-check"), Route::SystemCheck);
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(Route::parse("/events/e42/tickets"), Route::NotFound);
        assert_eq!(Route::parse("/admin"), Route::NotFound);
    }

    #[test]
    fn paths_round_trip() {
        let routes = [
            Route::Home,
            Route::Auth,
            Route::ArtistProfile("a1".into()),
            Route::FanProfile("f1".into()),
            Route::Map,
            Route::Events,
            Route::EventDetail("e1".into()),
            Route::Artists,
            Route::CreateEvent,
            Route::EditEvent("e1".into()),
            Route::Donations,
            Route::SystemCheck,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), route);
        }
        assert!(Route::EditEvent("e1".into()).needs_artist());
        assert!(!Route::Map.needs_artist());
    }
}
