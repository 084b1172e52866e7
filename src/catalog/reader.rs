use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::{
    config::ServiceFlavor,
    error::{ProbeError, Result},
    executor::{ENV_TAG, MICROSERVICE_TAG},
};

use super::model::EndpointDescriptor;

pub fn catalog_file_name(flavor: ServiceFlavor) -> &'static str {
    match flavor {
        ServiceFlavor::Standard => "api_list.json",
        ServiceFlavor::Golia => "golia_api_list.json",
    }
}

pub fn catalog_path(dir: &Path, flavor: ServiceFlavor) -> PathBuf {
    dir.join(catalog_file_name(flavor))
}

/// Reads the ordered endpoint list for a flavor from `dir`.
pub async fn load_catalog(dir: &Path, flavor: ServiceFlavor) -> Result<Vec<EndpointDescriptor>> {
    let path = catalog_path(dir, flavor);
    let raw = fs::read_to_string(&path)
        .await
        .map_err(|source| ProbeError::io(&path, source))?;

    let descriptors = parse_catalog(&raw).map_err(|message| ProbeError::Catalog {
        path: path.clone(),
        message,
    })?;
    debug!(path = %path.display(), endpoints = descriptors.len(), "loaded endpoint catalog");
    Ok(descriptors)
}

fn parse_catalog(raw: &str) -> std::result::Result<Vec<EndpointDescriptor>, String> {
    let descriptors: Vec<EndpointDescriptor> =
        serde_json::from_str(raw).map_err(|err| err.to_string())?;

    if let Some(index) = descriptors
        .iter()
        .position(|descriptor| descriptor.route.trim().is_empty())
    {
        return Err(format!("entry {index} has an empty route"));
    }
    // Routes are result keys and must not shadow the document tags.
    let reserved = [MICROSERVICE_TAG, ENV_TAG];
    if let Some((index, descriptor)) = descriptors
        .iter()
        .enumerate()
        .find(|(_, descriptor)| reserved.contains(&descriptor.route.as_str()))
    {
        return Err(format!(
            "entry {index} uses reserved route {:?}",
            descriptor.route
        ));
    }
    Ok(descriptors)
}
