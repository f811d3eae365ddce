//! Create/edit event workflow: the draft the UI edits, the location picker
//! beside it, and the glue to geocoding and the store.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::Store;
use crate::error::{AppError, Notice};
use crate::geocoding::{AddressResolver, GeocodingClient, ReverseAddress};
use crate::models::{self, Address, Coordinates, Event, GeocodeResult, Role};
use crate::picker::{self, Interaction, LocationPicker, ViewTransition};
use crate::session::Session;
use crate::taxonomy::Category;
use crate::validation::{self, ValidationError};

pub const LOCATION_NOT_UPDATED: &str = "could not update location";

/// What the UI edits. Categories use the UI keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    #[serde(flatten)]
    pub address: Address,
    pub categories: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_path: Option<String>,
    pub ticket_url: Option<String>,
    pub video_url: Option<String>,
}

impl EventDraft {
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            date: Some(event.date),
            time: event.time,
            address: event.address.clone(),
            categories: event
                .categories
                .iter()
                .map(|category| category.ui_key().to_string())
                .collect(),
            latitude: event.latitude,
            longitude: event.longitude,
            image_path: event.image_path.clone(),
            ticket_url: event.ticket_url.clone(),
            video_url: event.video_url.clone(),
        }
    }

    pub fn categories(&self) -> Result<Vec<Category>, ValidationError> {
        let mut out: Vec<Category> = Vec::new();
        for key in &self.categories {
            let category = Category::from_ui_key(key)
                .ok_or_else(|| ValidationError::UnknownCategory(key.clone()))?;
            if !out.contains(&category) {
                out.push(category);
            }
        }
        if out.is_empty() {
            return Err(ValidationError::NoCategory);
        }
        Ok(out)
    }

    pub fn coordinates(&self) -> Result<Option<Coordinates>, ValidationError> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            _ => Err(ValidationError::PartialCoordinates),
        }
    }

    /// Checks every required field and builds a fresh event owned by `artist_id`.
    pub fn to_event(&self, artist_id: &str, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        let title = validation::require("title", &self.title)?.to_string();
        let description = validation::require("description", &self.description)?.to_string();
        let date = self.date.ok_or(ValidationError::Required("date"))?;
        validation::require("address", &self.address.address)?;
        validation::require("city", &self.address.city)?;
        let categories = self.categories()?;
        let coordinates = self.coordinates()?;
        let ticket_url = validation::check_link("ticket link", self.ticket_url.as_deref())?;
        let video_url = validation::check_link("video link", self.video_url.as_deref())?;

        Ok(Event {
            id: models::event_id(artist_id, date, &title, now),
            artist_id: artist_id.to_string(),
            title,
            description,
            date,
            time: self.time,
            address: self.address.clone(),
            categories,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            image_path: self
                .image_path
                .clone()
                .filter(|path| !path.trim().is_empty()),
            ticket_url,
            video_url,
            created_at_utc: now,
            updated_at_utc: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { event_id: String },
}

/// Result of pushing a geocode into the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationUpdate {
    pub transition: ViewTransition,
    pub precision: Option<f64>,
    pub notice: Option<Notice>,
}

pub struct EventForm {
    mode: FormMode,
    draft: EventDraft,
    picker: LocationPicker,
}

impl EventForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            draft: EventDraft::default(),
            picker: LocationPicker::default(),
        }
    }

    pub fn edit(event: &Event) -> Self {
        Self {
            mode: FormMode::Edit {
                event_id: event.id.clone(),
            },
            draft: EventDraft::from_event(event),
            picker: LocationPicker::new(event.coordinates()),
        }
    }

    /// Create-mode form around a draft the UI already holds. The picker
    /// starts at the draft's coordinates when they are usable.
    pub fn from_draft(draft: EventDraft) -> Self {
        let at = draft.coordinates().ok().flatten();
        Self {
            mode: FormMode::Create,
            draft,
            picker: LocationPicker::new(at),
        }
    }

    pub fn into_draft(self) -> EventDraft {
        self.draft
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut EventDraft {
        &mut self.draft
    }

    pub fn picker(&self) -> &LocationPicker {
        &self.picker
    }

    /// A missing result, or one at the unset 0/0 pair, leaves the draft and
    /// the picker alone and yields a notice.
    pub fn apply_geocode(&mut self, outcome: Option<GeocodeResult>) -> LocationUpdate {
        let found = outcome
            .and_then(|r| r.coordinates().map(|at| (at, r)))
            .filter(|(at, _)| !at.is_unset());
        let Some((at, result)) = found else {
            return LocationUpdate {
                transition: ViewTransition::Stay,
                precision: None,
                notice: Some(Notice::warning(LOCATION_NOT_UPDATED)),
            };
        };
        self.set_coordinates(at);
        LocationUpdate {
            transition: self.picker.set_programmatic(at),
            precision: Some(result.precision),
            notice: None,
        }
    }

    /// Runs the debounced forward lookup for the current address.
    /// `None` when a newer edit took over.
    pub async fn relocate(&mut self, resolver: &AddressResolver) -> Option<LocationUpdate> {
        let outcome = resolver.resolve(self.draft.address.clone()).await.fresh()?;
        Some(self.apply_geocode(outcome))
    }

    pub fn apply_interaction(&mut self, interaction: Interaction) -> Coordinates {
        let at = self.picker.handle_interaction(interaction);
        self.set_coordinates(at);
        at
    }

    pub fn apply_reverse(&mut self, found: Option<&ReverseAddress>) -> Option<Notice> {
        match found {
            Some(found) => {
                picker::apply_reverse(&mut self.draft.address, found);
                None
            }
            None => Some(Notice::warning(LOCATION_NOT_UPDATED)),
        }
    }

    /// User moved the pin: take the coordinate, then try to fill the address.
    pub async fn pick(
        &mut self,
        interaction: Interaction,
        geocoder: &GeocodingClient,
    ) -> Option<Notice> {
        let at = self.apply_interaction(interaction);
        let found = geocoder.reverse(at).await;
        self.apply_reverse(found.as_ref())
    }

    pub fn submit(&self, store: &Store, session: &Session) -> Result<Event, AppError> {
        if session.role != Role::Artist {
            return Err(AppError::Unauthorized(
                "only artists can publish events".to_string(),
            ));
        }
        let now = Utc::now();
        let mut event = self.draft.to_event(&session.user_id, now)?;

        match &self.mode {
            FormMode::Create => {
                store.insert_event(&event)?;
                Ok(event)
            }
            FormMode::Edit { event_id } => {
                event.id = event_id.clone();
                let updated = store.update_event(&session.user_id, &event)?;
                info!(event_id = %updated.id, "event saved from form");
                Ok(updated)
            }
        }
    }

    fn set_coordinates(&mut self, at: Coordinates) {
        debug!(lat = at.latitude, lng = at.longitude, "form coordinates updated");
        self.draft.latitude = Some(at.latitude);
        self.draft.longitude = Some(at.longitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoticeLevel;
    use crate::models::{Artist, SocialLinks};
    use pretty_assertions::assert_eq;

    fn filled_draft() -> EventDraft {
        EventDraft {
            title: "Noche de Tango".into(),
            description: "Live orchestra".into(),
            date: NaiveDate::from_ymd_opt(2025, 9, 12),
            time: NaiveTime::from_hms_opt(21, 0, 0),
            address: Address {
                address: "Av. Corrientes 1234".into(),
                city: "Buenos Aires".into(),
                ..Address::default()
            },
            categories: vec!["music".into(), "theater".into(), "music".into()],
            latitude: None,
            longitude: None,
            image_path: Some("  ".into()),
            ticket_url: Some("https://tickets.example.com/tango".into()),
            video_url: None,
        }
    }

    fn artist_session(id: &str) -> Session {
        Session {
            user_id: id.into(),
            role: Role::Artist,
            email: format!("{id}@seekart.app"),
        }
    }

    fn store_with_artists() -> Store {
        let store = Store::open_in_memory().unwrap();
        for id in ["a1", "a2"] {
            store
                .upsert_artist(&Artist {
                    id: id.into(),
                    display_name: id.to_uppercase(),
                    bio: None,
                    image_path: None,
                    social: SocialLinks::default(),
                    follower_count: 0,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn draft_builds_a_valid_event() {
        let now = Utc::now();
        let event = filled_draft().to_event("a1", now).unwrap();
        assert_eq!(event.categories, vec![Category::Music, Category::Theater]);
        assert_eq!(event.image_path, None);
        assert_eq!(event.artist_id, "a1");
        assert!(event.check().is_ok());
    }

    #[test]
    fn draft_reports_first_missing_field() {
        let mut draft = filled_draft();
        draft.title.clear();
        assert_eq!(
            draft.to_event("a1", Utc::now()),
            Err(ValidationError::Required("title"))
        );

        let mut draft = filled_draft();
        draft.date = None;
        assert_eq!(
            draft.to_event("a1", Utc::now()),
            Err(ValidationError::Required("date"))
        );

        let mut draft = filled_draft();
        draft.categories = vec!["Música".into()];
        assert_eq!(
            draft.to_event("a1", Utc::now()),
            Err(ValidationError::UnknownCategory("Música".into()))
        );

        let mut draft = filled_draft();
        draft.categories.clear();
        assert_eq!(draft.to_event("a1", Utc::now()), Err(ValidationError::NoCategory));

        let mut draft = filled_draft();
        draft.latitude = Some(10.0);
        assert_eq!(
            draft.to_event("a1", Utc::now()),
            Err(ValidationError::PartialCoordinates)
        );
    }

    #[test]
    fn geocode_result_moves_picker_and_draft() {
        let mut form = EventForm::create();
        let update = form.apply_geocode(Some(GeocodeResult {
            latitude: -34.6037,
            longitude: -58.3816,
            precision: 0.9,
        }));
        assert!(matches!(update.transition, ViewTransition::FlyTo { .. }));
        assert_eq!(update.precision, Some(0.9));
        assert_eq!(update.notice, None);
        assert_eq!(form.draft().latitude, Some(-34.6037));
        assert_eq!(
            form.picker().position(),
            Some(Coordinates::new(-34.6037, -58.3816).unwrap())
        );
    }

    #[test]
    fn missing_geocode_keeps_coordinates_and_warns() {
        let mut form = EventForm::create();
        form.apply_interaction(Interaction::Click(Coordinates::new(1.0, 2.0).unwrap()));
        let update = form.apply_geocode(None);
        assert_eq!(update.transition, ViewTransition::Stay);
        let notice = update.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, LOCATION_NOT_UPDATED);
        assert_eq!(form.draft().latitude, Some(1.0));
        assert_eq!(form.draft().longitude, Some(2.0));
    }

    #[test]
    fn zero_pair_result_counts_as_no_result() {
        let mut form = EventForm::create();
        let clicked = Coordinates::new(1.0, 2.0).unwrap();
        form.apply_interaction(Interaction::Click(clicked));

        let update = form.apply_geocode(Some(GeocodeResult {
            latitude: 0.0,
            longitude: 0.0,
            precision: 0.8,
        }));
        assert_eq!(
            update,
            LocationUpdate {
                transition: ViewTransition::Stay,
                precision: None,
                notice: Some(Notice::warning(LOCATION_NOT_UPDATED)),
            }
        );
        assert_eq!(form.picker().position(), Some(clicked));
        assert_eq!(form.draft().latitude, Some(1.0));
        assert_eq!(form.draft().longitude, Some(2.0));
    }

    #[test]
    fn reverse_result_fills_address() {
        let mut form = EventForm::create();
        let notice = form.apply_reverse(Some(&ReverseAddress {
            address: Some("Florida 100".into()),
            city: Some("Buenos Aires".into()),
            ..ReverseAddress::default()
        }));
        assert_eq!(notice, None);
        assert_eq!(form.draft().address.address, "Florida 100");
        assert!(form.apply_reverse(None).is_some());
    }

    #[test]
    fn create_then_edit_through_the_store() {
        let store = store_with_artists();
        let mut form = EventForm::create();
        *form.draft_mut() = filled_draft();
        form.apply_interaction(Interaction::DragEnd(
            Coordinates::new(-34.6037, -58.3816).unwrap(),
        ));
        let created = form.submit(&store, &artist_session("a1")).unwrap();
        let stored = store.get_event(&created.id).unwrap();
        assert_eq!(stored.title, created.title);
        assert_eq!(stored.categories, created.categories);

        let mut edit = EventForm::edit(&created);
        assert_eq!(edit.mode(), &FormMode::Edit { event_id: created.id.clone() });
        edit.draft_mut().title = "Noche de Tango II".into();

        let denied = edit.submit(&store, &artist_session("a2"));
        assert!(matches!(denied, Err(AppError::Unauthorized(_))));

        let saved = edit.submit(&store, &artist_session("a1")).unwrap();
        assert_eq!(saved.id, created.id);
        assert_eq!(saved.created_at_utc, created.created_at_utc);
        assert_eq!(store.get_event(&created.id).unwrap().title, "Noche de Tango II");
    }

    #[test]
    fn fans_cannot_publish() {
        let store = store_with_artists();
        let mut form = EventForm::create();
        *form.draft_mut() = filled_draft();
        let fan = Session {
            user_id: "f1".into(),
            role: Role::Fan,
            email: "f1@seekart.app".into(),
        };
        assert!(matches!(form.submit(&store, &fan), Err(AppError::Unauthorized(_))));
    }
}
