use std::collections::HashMap;

pub type EnvMap = HashMap<String, String>;

mod loader;
mod placeholders;

pub use loader::{env_file_name, load_env_file_sync, load_pair_env};
pub use placeholders::{expand_placeholders, PlaceholderError};
