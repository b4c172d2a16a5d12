// Application state for HTTP handlers
use crate::application::live_view::LiveView;
use crate::application::log_view::LogView;
use crate::application::preferences::Preferences;

#[derive(Clone)]
pub struct AppState {
    pub live_view: LiveView,
    pub log_view: LogView,
    pub preferences: Preferences,
}
