mod model;
mod reader;

pub use model::EndpointDescriptor;
pub use reader::{catalog_file_name, catalog_path, load_catalog};
