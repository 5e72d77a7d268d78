//! Camera permission API.

use thiserror::Error;

/// The authorization status of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum PermissionStatus {
    /// The user was never asked.
    NotDetermined,
    /// Access to the camera was granted.
    Granted,
    /// The user refused access to the camera.
    Denied,
    /// Access is not possible on this system, and the user cannot change it.
    Restricted,
}

impl PermissionStatus {
    /// The action to perform when the screen loads with this status.
    pub fn action(self) -> PermissionAction {
        match self {
            Self::NotDetermined => PermissionAction::Request,
            Self::Denied => PermissionAction::OpenSettings,
            Self::Granted | Self::Restricted => PermissionAction::None,
        }
    }
}

/// The reaction of the scanner to a [`PermissionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    /// Nothing to do.
    None,
    /// Ask the user for access.
    Request,
    /// Send the user to the system settings.
    OpenSettings,
}

/// An error from the permission backend.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// The system settings could not be opened.
    #[error("could not open the system settings: {0}")]
    Settings(String),
    /// The permission service could not be reached.
    #[cfg(not(target_os = "linux"))]
    #[error("could not reach the permission service: {0}")]
    Unavailable(String),
}

/// Trait implemented by camera permission backends.
pub(crate) trait PermissionProvider {
    /// The current authorization status.
    fn status(&self) -> PermissionStatus;

    /// Ask the user for access to the camera.
    ///
    /// Returns whether access was granted.
    async fn request_access(&self) -> bool;

    /// Open the camera section of the system settings.
    fn open_settings(&self) -> Result<(), PermissionError>;
}
