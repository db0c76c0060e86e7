//! Home page curation singleton.

use serde::{Deserialize, Serialize};

/// One curated home page section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HomeSection {
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    /// Ordered weak references into the section's collection
    #[serde(default)]
    pub selected_ids: Vec<String>,
}

fn default_visible() -> bool {
    true
}

impl Default for HomeSection {
    fn default() -> Self {
        Self {
            is_visible: true,
            selected_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HomeSections {
    #[serde(default)]
    pub sites: HomeSection,
    #[serde(default)]
    pub blogs: HomeSection,
    #[serde(default)]
    pub news: HomeSection,
    #[serde(default)]
    pub coupons: HomeSection,
    #[serde(default)]
    pub games: HomeSection,
}

/// The single default home page configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageConfig {
    #[serde(rename = "_id")]
    pub id: String,
    pub is_default: bool,
    pub sections: HomeSections,
    pub updated_at: String,
}

/// Request body for creating or replacing the home page configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HomePageRequest {
    #[serde(default)]
    pub sections: HomeSections,
}
