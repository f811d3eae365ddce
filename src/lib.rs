#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod db;
pub mod debounce;
pub mod error;
pub mod event_form;
pub mod geocoding;
pub mod logging;
pub mod markers;
pub mod models;
pub mod picker;
pub mod profile;
pub mod routes;
pub mod session;
pub mod storage;
pub mod system_check;
pub mod taxonomy;
pub mod utils;
pub mod validation;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use crate::config::{AppConfig, ConfigStore};
    use crate::db::Store;
    use crate::geocoding::AddressResolver;
    use crate::session::SessionContext;

    let config_store = ConfigStore::load();
    let config = config_store.read();
    logging::init(&config.log_level);

    let resolver = AddressResolver::from_config(&config).unwrap_or_else(|err| {
        tracing::warn!("geocoding config rejected, using defaults: {err}");
        let defaults = AppConfig {
            mapbox_token: config.mapbox_token.clone(),
            ..AppConfig::default()
        };
        match AddressResolver::from_config(&defaults) {
            Ok(resolver) => resolver,
            Err(err) => panic!("default geocoding endpoint rejected: {err}"),
        }
    });

    let result = tauri::Builder::default()
        .manage(config_store)
        .manage(commands::GeoState::new(resolver))
        .manage(SessionContext::new())
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(commands::handler())
        .setup(|_| {
            Store::open_default().map_err(|e| -> Box<dyn std::error::Error> { Box::new(e) })?;
            Ok(())
        })
        .run(tauri::generate_context!());

    if let Err(err) = result {
        tracing::error!("error while running tauri application: {err}");
        std::process::exit(1);
    }
}
