mod api;
mod fetch;
mod filter;
mod models;
mod portal;
mod resolver;
mod session_store;

use std::sync::Arc;

use api::{HttpPortalClient, PortalApi};
use portal::{
    commands::{
        apply_preset, apply_range, clear_filter, load_session, login, logout, refresh_attendance,
    },
    PortalController,
};
use session_store::SessionStore;
use tauri::Manager;

pub(crate) struct AppState {
    pub(crate) portal: PortalController,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Student portal starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let session_path = app_data_dir.join("session.json");
                let store = Arc::new(SessionStore::new(session_path)?);
                let client: Arc<dyn PortalApi> = Arc::new(HttpPortalClient::from_env()?);

                app.manage(AppState {
                    portal: PortalController::new(store, client),
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            login,
            load_session,
            refresh_attendance,
            apply_preset,
            apply_range,
            clear_filter,
            logout,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
