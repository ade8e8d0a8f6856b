//! Typed view of the supervisor's status document.
//!
//! [`decode`] turns the raw bytes of a status response into an immutable
//! [`Status`] snapshot. A snapshot is either fully decoded or not produced at
//! all; group members stay plain names and are resolved against the snapshot
//! on lookup, so dangling references are tolerated.

mod codes;
mod raw;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Serialize;

use crate::charset;
use crate::error::DecodeError;

pub use codes::{DerivedState, FailureFlags, PendingAction, derive_state};

/// One service entry of a status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    name: String,
    monitored: bool,
    status_code: u32,
    pending_action_code: u32,
    state: DerivedState,
    status_message: String,
}

impl Service {
    /// Builds a service from its raw wire codes, deriving its state.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        monitored: bool,
        status_code: u32,
        pending_action_code: u32,
        status_message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            monitored,
            status_code,
            pending_action_code,
            state: derive_state(monitored, status_code, pending_action_code),
            status_message: status_message.into(),
        }
    }

    /// Service name, unique within its snapshot.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the supervisor is watching the service.
    #[must_use]
    pub const fn monitored(&self) -> bool {
        self.monitored
    }

    /// Raw failure bitmask.
    #[must_use]
    pub const fn status_code(&self) -> u32 {
        self.status_code
    }

    /// Raw pending-action code.
    #[must_use]
    pub const fn pending_action_code(&self) -> u32 {
        self.pending_action_code
    }

    /// Pending action decoded from the raw code.
    #[must_use]
    pub const fn pending_action(&self) -> PendingAction {
        PendingAction::from_code(self.pending_action_code)
    }

    /// Semantic state.
    #[must_use]
    pub const fn state(&self) -> DerivedState {
        self.state
    }

    /// Supervisor's free-text message; empty when none was reported.
    #[must_use]
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// True while the supervisor still has an action queued.
    #[must_use]
    pub const fn pending(&self) -> bool {
        self.pending_action_code != 0
    }

    /// True when nothing is queued and a failure bit is set.
    #[must_use]
    pub const fn errored(&self) -> bool {
        !self.pending() && self.status_code != 0
    }
}

/// A named group of service references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceGroup {
    name: String,
    member_names: Vec<String>,
}

impl ServiceGroup {
    /// Builds a group from its member names.
    #[must_use]
    pub fn new(name: impl Into<String>, member_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            member_names,
        }
    }

    /// Group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member names in document order; may reference absent services.
    #[must_use]
    pub fn member_names(&self) -> &[String] {
        &self.member_names
    }
}

/// Immutable snapshot of the supervisor's state from one status query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    services: Vec<Service>,
    groups: Vec<ServiceGroup>,
    #[serde(skip)]
    service_index: HashMap<String, usize>,
    #[serde(skip)]
    group_index: HashMap<String, usize>,
}

impl Status {
    /// Assembles a snapshot, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::DuplicateService`] or
    /// [`DecodeError::DuplicateGroup`] when a name repeats.
    pub fn from_parts(
        services: Vec<Service>,
        groups: Vec<ServiceGroup>,
    ) -> Result<Self, DecodeError> {
        let service_index = index_by_name(&services, Service::name, |name| {
            DecodeError::DuplicateService { name }
        })?;
        let group_index = index_by_name(&groups, ServiceGroup::name, |name| {
            DecodeError::DuplicateGroup { name }
        })?;
        Ok(Self {
            services,
            groups,
            service_index,
            group_index,
        })
    }

    /// Looks a service up by exact name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.service_index
            .get(name)
            .and_then(|&index| self.services.get(index))
    }

    /// Services in document order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// Looks a group up by exact name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&ServiceGroup> {
        self.group_index
            .get(name)
            .and_then(|&index| self.groups.get(index))
    }

    /// Groups in document order.
    pub fn groups(&self) -> impl Iterator<Item = &ServiceGroup> {
        self.groups.iter()
    }

    /// Member names of `group` in document order; empty when the group is
    /// absent.
    #[must_use]
    pub fn service_names_in_group(&self, group: &str) -> Vec<&str> {
        self.group(group)
            .map(|found| found.member_names().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Members of `group` resolved to services, skipping dangling names.
    #[must_use]
    pub fn services_in_group(&self, group: &str) -> Vec<&Service> {
        self.service_names_in_group(group)
            .into_iter()
            .filter_map(|name| self.service(name))
            .collect()
    }
}

fn index_by_name<T>(
    items: &[T],
    name_of: fn(&T) -> &str,
    duplicate: fn(String) -> DecodeError,
) -> Result<HashMap<String, usize>, DecodeError> {
    let mut index = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match index.entry(name_of(item).to_owned()) {
            Entry::Occupied(entry) => return Err(duplicate(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(position);
            }
        }
    }
    Ok(index)
}

/// Decodes a status document into a snapshot.
///
/// # Errors
///
/// Returns [`DecodeError`] when the document declares an unsupported
/// encoding, is not well-formed against the expected schema, or repeats a
/// service or group name.
pub fn decode(document: &[u8]) -> Result<Status, DecodeError> {
    let text = charset::normalise(document)?;
    let raw: raw::RawDocument =
        quick_xml::de::from_str(&text).map_err(|source| DecodeError::Malformed { source })?;
    let services = raw
        .services
        .entries
        .into_iter()
        .map(|entry| {
            Service::new(
                entry.name,
                entry.monitor != 0,
                entry.status,
                entry.pendingaction,
                entry.status_message.unwrap_or_default(),
            )
        })
        .collect();
    let groups = raw
        .servicegroups
        .entries
        .into_iter()
        .map(|entry| ServiceGroup::new(entry.name, entry.members))
        .collect();
    Status::from_parts(services, groups)
}
