use chrono::NaiveDate;
use tauri::State;

use crate::AppState;

use super::state::PortalSnapshot;

#[tauri::command]
pub async fn login(
    state: State<'_, AppState>,
    email: String,
    password: String,
) -> Result<PortalSnapshot, String> {
    state
        .portal
        .login(&email, &password)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn load_session(state: State<'_, AppState>) -> Result<PortalSnapshot, String> {
    Ok(state.portal.load_session().await)
}

#[tauri::command]
pub async fn refresh_attendance(
    state: State<'_, AppState>,
    is_refresh: Option<bool>,
) -> Result<PortalSnapshot, String> {
    Ok(state
        .portal
        .refresh_attendance(is_refresh.unwrap_or(false))
        .await)
}

#[tauri::command]
pub async fn apply_preset(
    state: State<'_, AppState>,
    preset: String,
) -> Result<PortalSnapshot, String> {
    Ok(state.portal.apply_preset(&preset).await)
}

#[tauri::command]
pub async fn apply_range(
    state: State<'_, AppState>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PortalSnapshot, String> {
    Ok(state.portal.apply_range(start, end).await)
}

#[tauri::command]
pub async fn clear_filter(state: State<'_, AppState>) -> Result<PortalSnapshot, String> {
    Ok(state.portal.clear_filter().await)
}

#[tauri::command]
pub async fn logout(state: State<'_, AppState>) -> Result<PortalSnapshot, String> {
    Ok(state.portal.logout().await)
}
