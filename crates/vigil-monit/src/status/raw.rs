//! Wire shape of `/_status2?format=xml`.
//!
//! Only the children the client acts on are declared; everything else the
//! supervisor emits is skipped by serde.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawDocument {
    #[serde(default)]
    pub services: RawServices,
    #[serde(default)]
    pub servicegroups: RawGroups,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawServices {
    #[serde(rename = "service", default)]
    pub entries: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawService {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(default)]
    pub monitor: u32,
    #[serde(default)]
    pub status: u32,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub pendingaction: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawGroups {
    #[serde(rename = "servicegroup", default)]
    pub entries: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawGroup {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "service", default)]
    pub members: Vec<String>,
}
