mod http;
mod loader;
mod run_config;

pub use http::{HttpOptions, DEFAULT_USER_AGENT};
pub use loader::{load_settings, LoadedSettings, ProbeSettings, SETTINGS_FILE_NAME};
pub use run_config::{RunConfig, ServiceFlavor, SessionProtocol};
