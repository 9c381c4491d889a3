//! Runtime permission collaborator

use std::collections::HashMap;

/// Capabilities the geolocator may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Never asked, or the answer is not known yet
    Unknown,
}

/// Operating system permission subsystem
pub trait PermissionService: Send {
    /// Current status without prompting
    fn check_status(&self, permission: Permission) -> PermissionStatus;

    /// Prompt the user for the given permissions.
    /// May block until the user has answered.
    fn request(&self, permissions: &[Permission]) -> HashMap<Permission, PermissionStatus>;
}
