//! Role → location lookup.
//!
//! The push phase names its three locations by role. Names are matched
//! exactly. Names are expected to be unique; if two locations share one, the
//! last match wins and a warning is logged.

use std::fmt;

use locsync_core::types::LocationName;

use crate::error::SyncError;
use crate::location::LocationHandle;

/// Part a location plays in a push run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Staging location both phases meet at.
    Sync,
    /// Where the selection is copied from.
    Input,
    /// Final destination, pulled into by the receiving side.
    Output,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Sync, Role::Input, Role::Output];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Sync => write!(f, "sync"),
            Role::Input => write!(f, "input"),
            Role::Output => write!(f, "output"),
        }
    }
}

/// Requested location name per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequest {
    pub sync: LocationName,
    pub input: LocationName,
    pub output: LocationName,
}

impl RoleRequest {
    pub fn name(&self, role: Role) -> &LocationName {
        match role {
            Role::Sync => &self.sync,
            Role::Input => &self.input,
            Role::Output => &self.output,
        }
    }
}

/// Every role bound to a location.
#[derive(Debug, Clone)]
pub struct ResolvedRoles {
    pub sync: LocationHandle,
    pub input: LocationHandle,
    pub output: LocationHandle,
}

impl ResolvedRoles {
    pub fn get(&self, role: Role) -> &LocationHandle {
        match role {
            Role::Sync => &self.sync,
            Role::Input => &self.input,
            Role::Output => &self.output,
        }
    }
}

/// Bind each role of `request` to the location with that exact name.
pub fn resolve_roles(
    locations: &[LocationHandle],
    request: &RoleRequest,
) -> Result<ResolvedRoles, SyncError> {
    let mut found: [Option<&LocationHandle>; 3] = [None, None, None];

    for location in locations {
        for (slot, role) in Role::ALL.iter().enumerate() {
            if location.name() != request.name(*role) {
                continue;
            }
            if let Some(previous) = found[slot] {
                tracing::warn!(
                    "duplicate location name {} ({} and {}); using the last one for role {}",
                    location.name(),
                    previous.id(),
                    location.id(),
                    role
                );
            }
            tracing::debug!("found location {} for role {}", location.name(), role);
            found[slot] = Some(location);
        }
    }

    let take = |slot: usize| -> Result<LocationHandle, SyncError> {
        let role = Role::ALL[slot];
        found[slot].cloned().ok_or_else(|| SyncError::UnresolvedRole {
            role,
            name: request.name(role).clone(),
        })
    };

    Ok(ResolvedRoles {
        sync: take(0)?,
        input: take(1)?,
        output: take(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySession;
    use crate::session::Session;

    fn request(sync: &str, input: &str, output: &str) -> RoleRequest {
        RoleRequest {
            sync: LocationName::from(sync),
            input: LocationName::from(input),
            output: LocationName::from(output),
        }
    }

    #[test]
    fn resolves_each_role_by_exact_name() {
        let session = MemorySession::new();
        for name in ["A", "B", "C"] {
            session.add_location(name, None);
        }
        let resolved =
            resolve_roles(&session.locations().unwrap(), &request("B", "A", "C")).expect("resolve");
        assert_eq!(resolved.sync.name().as_str(), "B");
        assert_eq!(resolved.input.name().as_str(), "A");
        assert_eq!(resolved.output.name().as_str(), "C");
    }

    #[test]
    fn one_location_may_fill_several_roles() {
        let session = MemorySession::new();
        session.add_location("A", None);
        session.add_location("B", None);
        let resolved =
            resolve_roles(&session.locations().unwrap(), &request("B", "A", "A")).expect("resolve");
        assert_eq!(resolved.get(Role::Input).id(), resolved.get(Role::Output).id());
    }

    #[test]
    fn missing_role_is_an_error() {
        let session = MemorySession::new();
        session.add_location("A", None);
        session.add_location("B", None);
        let err = resolve_roles(&session.locations().unwrap(), &request("B", "A", "Z")).unwrap_err();
        match err {
            SyncError::UnresolvedRole { role, name } => {
                assert_eq!(role, Role::Output);
                assert_eq!(name.as_str(), "Z");
            }
            other => panic!("expected unresolved role, got {other:?}"),
        }
    }

    #[test]
    fn partial_name_does_not_match() {
        let session = MemorySession::new();
        session.add_location("ftrack.sync.old", None);
        let err =
            resolve_roles(&session.locations().unwrap(), &request("ftrack.sync", "ftrack.sync.old", "ftrack.sync.old"))
                .unwrap_err();
        assert!(err.to_string().contains("role sync"));
    }

    #[test]
    fn duplicate_names_last_match_wins() {
        let session = MemorySession::new();
        let first = session.add_location("A", None);
        session.add_location("B", None);
        let mut twin = first.location().clone();
        twin.id = locsync_core::types::LocationId::from("loc-A-2");

        let mut all = session.locations().unwrap();
        all.push(LocationHandle::new(twin, None));

        let resolved = resolve_roles(&all, &request("B", "A", "B")).expect("resolve");
        assert_eq!(resolved.input.id().as_str(), "loc-A-2");
    }
}
