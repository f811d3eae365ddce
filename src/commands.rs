//! The command surface the webview invokes. Store work runs on the blocking
//! pool with a connection opened per call. Failures reach the UI as `Notice`s.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tauri::State;
use tracing::warn;

use crate::config::{AppConfig, ConfigStore};
use crate::db::{EventQuery, Store};
use crate::error::{AppError, Notice};
use crate::event_form::{EventDraft, EventForm, LocationUpdate};
use crate::geocoding::{AddressResolver, GeocodingClient};
use crate::markers::{CategoryFilter, MapEvent, Marker, MarkerLayer};
use crate::models::{Artist, Coordinates, Event, Fan, Role};
use crate::picker::Interaction;
use crate::profile::{self, ProfileDraft};
use crate::routes::Route;
use crate::session::{Session, SessionContext};
use crate::storage::{self, Bucket};
use crate::system_check::{self, Check};
use crate::validation::{self, RegistrationForm};

/// Holds the resolver so a config change can swap the client while keeping
/// the debounce generation shared.
pub struct GeoState {
    resolver: Mutex<AddressResolver>,
}

impl GeoState {
    pub fn new(resolver: AddressResolver) -> Self {
        Self {
            resolver: Mutex::new(resolver),
        }
    }

    fn resolver(&self) -> AddressResolver {
        self.resolver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn rebuild(&self, config: &AppConfig) -> Result<(), String> {
        let client = GeocodingClient::from_config(config).map_err(|e| e.to_string())?;
        let mut guard = self.resolver.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = guard.with_client(client);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GeocodeOutcome {
    Located {
        draft: EventDraft,
        update: LocationUpdate,
    },
    Superseded,
}

#[derive(Debug, Serialize)]
pub struct PickedLocation {
    pub draft: EventDraft,
    pub notice: Option<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct MapRequest {
    pub center: Option<Coordinates>,
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MapView {
    pub markers: Vec<Marker>,
    pub boundary: Vec<[f64; 2]>,
    pub radius_km: f64,
}

#[derive(Debug, Serialize)]
pub struct PasswordCheck {
    pub ok: bool,
    pub message: Option<String>,
}

async fn with_store<T, F>(work: F) -> Result<T, Notice>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> Result<T, AppError> + Send + 'static,
{
    tauri::async_runtime::spawn_blocking(move || -> Result<T, AppError> {
        let store = Store::open_default()?;
        work(&store)
    })
    .await
    .map_err(|e| AppError::Storage(e.to_string()))?
    .map_err(Notice::from)
}

fn signed_in(sessions: &SessionContext, role: Role) -> Result<Session, Notice> {
    sessions.require(role).map_err(Notice::from)
}

// --- Geocoding ---

/// Debounced forward lookup for the draft's address. The returned draft
/// carries the new coordinates when one was found.
#[tauri::command]
async fn geocode_address(
    draft: EventDraft,
    geo: State<'_, GeoState>,
) -> Result<GeocodeOutcome, Notice> {
    let resolver = geo.resolver();
    let mut form = EventForm::from_draft(draft);
    Ok(match form.relocate(&resolver).await {
        Some(update) => GeocodeOutcome::Located {
            draft: form.into_draft(),
            update,
        },
        None => GeocodeOutcome::Superseded,
    })
}

#[tauri::command]
async fn pick_location(
    draft: EventDraft,
    interaction: Interaction,
    geo: State<'_, GeoState>,
) -> Result<PickedLocation, Notice> {
    let resolver = geo.resolver();
    let mut form = EventForm::from_draft(draft);
    let notice = form.pick(interaction, resolver.client()).await;
    Ok(PickedLocation {
        draft: form.into_draft(),
        notice,
    })
}

// --- Map ---

#[tauri::command]
async fn map_view(
    request: MapRequest,
    config_store: State<'_, ConfigStore>,
) -> Result<MapView, Notice> {
    let config = config_store.read();
    let center = request.center.unwrap_or(config.map_center);
    let mut layer = MarkerLayer::new(center, config.map_radius_km);
    if let Some(radius) = request.radius_km {
        layer.set_radius(radius);
    }
    layer.set_filters(request.filters.into_iter().collect::<CategoryFilter>());

    let today = Utc::now().date_naive();
    let events = with_store(move |store| {
        Ok(store.list_events(&EventQuery {
            artist_id: None,
            from_date: Some(today),
        })?)
    })
    .await?;
    layer.set_events(events.iter().map(MapEvent::from).collect());

    Ok(MapView {
        markers: layer.markers().to_vec(),
        boundary: layer.boundary().to_vec(),
        radius_km: layer.radius_km(),
    })
}

// --- Validation & session ---

#[tauri::command]
fn check_password(password: String) -> PasswordCheck {
    match validation::check_password(&password) {
        Ok(()) => PasswordCheck {
            ok: true,
            message: None,
        },
        Err(err) => PasswordCheck {
            ok: false,
            message: Some(err.to_string()),
        },
    }
}

#[tauri::command]
fn validate_registration(form: RegistrationForm) -> Result<(), Notice> {
    form.check().map_err(|e| Notice::from(AppError::from(e)))
}

#[tauri::command]
fn sign_in(session: Session, sessions: State<'_, SessionContext>) {
    sessions.sign_in(session);
}

#[tauri::command]
fn sign_out(sessions: State<'_, SessionContext>) {
    sessions.sign_out();
}

#[tauri::command]
fn current_session(sessions: State<'_, SessionContext>) -> Option<Session> {
    sessions.current()
}

// --- Profiles ---

#[tauri::command]
async fn save_artist_profile(
    profile: ProfileDraft,
    sessions: State<'_, SessionContext>,
) -> Result<Artist, Notice> {
    let session = signed_in(&sessions, Role::Artist)?;
    with_store(move |store| profile::save_artist(store, &session, &profile)).await
}

#[tauri::command]
async fn save_fan_profile(
    profile: ProfileDraft,
    sessions: State<'_, SessionContext>,
) -> Result<Fan, Notice> {
    let session = signed_in(&sessions, Role::Fan)?;
    with_store(move |store| profile::save_fan(store, &session, &profile)).await
}

#[tauri::command]
async fn own_artist_profile(
    sessions: State<'_, SessionContext>,
) -> Result<Option<Artist>, Notice> {
    let session = signed_in(&sessions, Role::Artist)?;
    with_store(move |store| profile::own_artist(store, &session)).await
}

#[tauri::command]
async fn get_fan(fan_id: String) -> Result<Fan, Notice> {
    with_store(move |store| Ok(store.get_fan(&fan_id)?)).await
}

// --- Events ---

#[tauri::command]
async fn list_events(artist_id: Option<String>, upcoming: bool) -> Result<Vec<Event>, Notice> {
    let from_date = upcoming.then(|| Utc::now().date_naive());
    with_store(move |store| {
        Ok(store.list_events(&EventQuery {
            artist_id,
            from_date,
        })?)
    })
    .await
}

#[tauri::command]
async fn get_event(event_id: String) -> Result<Event, Notice> {
    with_store(move |store| Ok(store.get_event(&event_id)?)).await
}

#[tauri::command]
async fn create_event(
    draft: EventDraft,
    sessions: State<'_, SessionContext>,
) -> Result<Event, Notice> {
    let session = signed_in(&sessions, Role::Artist)?;
    with_store(move |store| EventForm::from_draft(draft).submit(store, &session)).await
}

#[tauri::command]
async fn update_event(
    event_id: String,
    draft: EventDraft,
    sessions: State<'_, SessionContext>,
) -> Result<Event, Notice> {
    let session = signed_in(&sessions, Role::Artist)?;
    with_store(move |store| {
        let existing = store.get_event(&event_id)?;
        let mut form = EventForm::edit(&existing);
        *form.draft_mut() = draft;
        form.submit(store, &session)
    })
    .await
}

#[tauri::command]
async fn delete_event(event_id: String, sessions: State<'_, SessionContext>) -> Result<(), Notice> {
    let session = signed_in(&sessions, Role::Artist)?;
    with_store(move |store| Ok(store.delete_event(&session.user_id, &event_id)?)).await
}

// --- Artists & follows ---

#[tauri::command]
async fn list_artists() -> Result<Vec<Artist>, Notice> {
    with_store(|store| Ok(store.list_artists()?)).await
}

#[tauri::command]
async fn get_artist(artist_id: String) -> Result<Artist, Notice> {
    with_store(move |store| Ok(store.get_artist(&artist_id)?)).await
}

#[tauri::command]
async fn follow_artist(
    artist_id: String,
    sessions: State<'_, SessionContext>,
) -> Result<u32, Notice> {
    let fan = signed_in(&sessions, Role::Fan)?;
    with_store(move |store| {
        store.follow(&fan.user_id, &artist_id)?;
        Ok(store.follower_count(&artist_id)?)
    })
    .await
}

#[tauri::command]
async fn unfollow_artist(
    artist_id: String,
    sessions: State<'_, SessionContext>,
) -> Result<u32, Notice> {
    let fan = signed_in(&sessions, Role::Fan)?;
    with_store(move |store| {
        store.unfollow(&fan.user_id, &artist_id)?;
        Ok(store.follower_count(&artist_id)?)
    })
    .await
}

#[tauri::command]
async fn is_following(
    artist_id: String,
    sessions: State<'_, SessionContext>,
) -> Result<bool, Notice> {
    let Some(session) = sessions.current().filter(|s| s.role == Role::Fan) else {
        return Ok(false);
    };
    with_store(move |store| Ok(store.is_following(&session.user_id, &artist_id)?)).await
}

#[tauri::command]
async fn followed_artists(sessions: State<'_, SessionContext>) -> Result<Vec<Artist>, Notice> {
    let fan = signed_in(&sessions, Role::Fan)?;
    with_store(move |store| Ok(store.followed_artists(&fan.user_id)?)).await
}

// --- Misc ---

#[tauri::command]
fn parse_route(path: String) -> Route {
    Route::parse(&path)
}

#[tauri::command]
fn image_url(
    bucket: Bucket,
    path: String,
    config_store: State<'_, ConfigStore>,
) -> Option<String> {
    let base = config_store.read().storage_url?;
    storage::public_url(&base, bucket, &path)
}

#[tauri::command]
async fn system_check(config_store: State<'_, ConfigStore>) -> Result<Vec<Check>, Notice> {
    let config = config_store.read();
    with_store(move |store| Ok(system_check::run_all(store, &config))).await
}

#[tauri::command]
fn get_config(config_store: State<'_, ConfigStore>) -> AppConfig {
    config_store.read()
}

#[tauri::command]
fn save_config(
    config: AppConfig,
    config_store: State<'_, ConfigStore>,
    geo: State<'_, GeoState>,
) -> Result<AppConfig, Notice> {
    let updated = config_store
        .update(|current| *current = config)
        .map_err(|e| Notice::from(AppError::Config(e)))?;
    if let Err(err) = geo.rebuild(&updated) {
        warn!("geocoding client not rebuilt: {err}");
    }
    Ok(updated)
}

pub fn handler() -> impl Fn(tauri::ipc::Invoke<tauri::Wry>) -> bool + Send + Sync + 'static {
    tauri::generate_handler![
        geocode_address,
        pick_location,
        map_view,
        check_password,
        validate_registration,
        sign_in,
        sign_out,
        current_session,
        save_artist_profile,
        save_fan_profile,
        own_artist_profile,
        get_fan,
        list_events,
        get_event,
        create_event,
        update_event,
        delete_event,
        list_artists,
        get_artist,
        follow_artist,
        unfollow_artist,
        is_following,
        followed_artists,
        parse_route,
        image_url,
        system_check,
        get_config,
        save_config
    ]
}
