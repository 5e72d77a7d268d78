// SPDX-License-Identifier: GPL-3.0-or-later
use std::{cell::Cell, time::Duration};

use ashpd::desktop::camera;
use gtk::{gio, prelude::*};
use tracing::{debug, error, info};

mod session;

pub(crate) use self::session::ApertureDevice;
use crate::{
    config::CAMERA_SETTINGS_COMMAND,
    scanner::{PermissionError, PermissionProvider, PermissionStatus},
    spawn_tokio,
    utils::timeout_future,
};

/// The maximum time to wait for the portal to list the cameras.
const CAMERA_PRESENCE_TIMEOUT: Duration = Duration::from_secs(1);

/// Camera permission through the XDG camera portal.
#[derive(Debug)]
pub(crate) struct PortalPermission {
    provider: aperture::DeviceProvider,
    /// The answer of the portal in this process, if any.
    answer: Cell<Option<PermissionStatus>>,
}

impl PortalPermission {
    pub(crate) fn new() -> Self {
        Self {
            provider: aperture::DeviceProvider::instance().clone(),
            answer: Default::default(),
        }
    }

    /// Whether the system has any cameras.
    async fn has_cameras() -> bool {
        let handle = spawn_tokio!(async move {
            let camera = match camera::Camera::new().await {
                Ok(camera) => camera,
                Err(error) => {
                    error!("Could not create instance of camera proxy: {error}");
                    return false;
                }
            };

            match camera.is_present().await {
                Ok(is_present) => is_present,
                Err(error) => {
                    error!("Could not check whether system has cameras: {error}");
                    false
                }
            }
        });
        let abort_handle = handle.abort_handle();

        match timeout_future(CAMERA_PRESENCE_TIMEOUT, handle).await {
            Ok(Ok(is_present)) => is_present,
            Ok(Err(error)) => {
                error!("Could not check whether system has cameras: {error}");
                false
            }
            Err(()) => {
                abort_handle.abort();
                error!("Could not check whether system has cameras: the request timed out");
                false
            }
        }
    }
}

impl PermissionProvider for PortalPermission {
    fn status(&self) -> PermissionStatus {
        if self.provider.started() {
            return PermissionStatus::Granted;
        }

        self.answer.get().unwrap_or(PermissionStatus::NotDetermined)
    }

    async fn request_access(&self) -> bool {
        if !Self::has_cameras().await {
            info!("No camera is present");
            self.answer.set(Some(PermissionStatus::Restricted));
            return false;
        }

        let handle = spawn_tokio!(camera::request());

        let request_result = match handle.await {
            Ok(request_result) => request_result,
            Err(error) => {
                error!("Camera request task failed: {error}");
                return false;
            }
        };

        match request_result {
            Ok(Some(fd)) => {
                self.answer.set(Some(PermissionStatus::Granted));

                // A provider that fails to start surfaces as a missing camera.
                if let Err(error) = self.provider.set_fd(fd) {
                    error!("Could not access camera: {error}");
                } else if let Err(error) = self.provider.start_with_default(|camera| {
                    matches!(camera.location(), aperture::CameraLocation::Back)
                }) {
                    error!("Could not access camera: {error}");
                }

                true
            }
            Ok(None) => {
                error!("Could not access camera: no camera present");
                self.answer.set(Some(PermissionStatus::Restricted));
                false
            }
            Err(error) => {
                debug!("Camera access was not granted: {error}");
                self.answer.set(Some(PermissionStatus::Denied));
                false
            }
        }
    }

    fn open_settings(&self) -> Result<(), PermissionError> {
        let app_info = gio::AppInfo::create_from_commandline(
            CAMERA_SETTINGS_COMMAND,
            None,
            gio::AppInfoCreateFlags::NONE,
        )
        .map_err(|error| PermissionError::Settings(error.to_string()))?;

        app_info
            .launch(&[], None::<&gio::AppLaunchContext>)
            .map_err(|error| PermissionError::Settings(error.to_string()))
    }
}
