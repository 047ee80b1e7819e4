use serde::Serialize;

use crate::config::Config;

pub const DOCCLOUD_PLATFORM_ID: &str = "bu_doccloud";

/// A delivery target known at compile time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub api_url: String,
}

impl PlatformInfo {
    fn new(id: &str, name: &str, description: &str, api_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

/// The fixed platform table, in listing order.
pub fn supported_platforms(config: &Config) -> Vec<PlatformInfo> {
    let urls = &config.platforms;
    vec![
        PlatformInfo::new(
            DOCCLOUD_PLATFORM_ID,
            "BU DocCloud",
            "Native BU document management platform",
            &config.doccloud.api_url,
        ),
        PlatformInfo::new(
            "sharepoint",
            "Microsoft SharePoint",
            "Microsoft's document management and storage system",
            &urls.sharepoint_api_url,
        ),
        PlatformInfo::new("box", "Box", "Cloud content management platform", &urls.box_api_url),
        PlatformInfo::new("dropbox", "Dropbox", "File hosting service", &urls.dropbox_api_url),
        PlatformInfo::new(
            "google_drive",
            "Google Drive",
            "Google's file storage and synchronization service",
            &urls.gdrive_api_url,
        ),
        PlatformInfo::new(
            "onedrive",
            "Microsoft OneDrive",
            "Microsoft's file hosting service",
            &urls.onedrive_api_url,
        ),
    ]
}
