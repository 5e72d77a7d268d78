//! Camera API.

#[cfg(target_os = "linux")]
mod linux;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// The camera permission API.
        pub(crate) type CameraPermission = linux::PortalPermission;
        /// The camera capture API.
        pub(crate) type CameraDevice = linux::ApertureDevice;
    } else {
        /// The camera permission API.
        pub(crate) type CameraPermission = unimplemented::UnimplementedPermission;
        /// The camera capture API.
        pub(crate) type CameraDevice = unimplemented::UnimplementedDevice;
    }
}

/// The fallback camera API, to use on platforms where it is unimplemented.
#[cfg(not(target_os = "linux"))]
mod unimplemented {
    use tracing::error;

    use crate::scanner::{
        CaptureDevice, CaptureSession, MetadataOutput, PermissionError, PermissionProvider,
        PermissionStatus, PipelineError, PreviewLayer,
    };

    #[derive(Debug)]
    pub(crate) struct UnimplementedPermission;

    impl UnimplementedPermission {
        pub(crate) fn new() -> Self {
            Self
        }
    }

    impl PermissionProvider for UnimplementedPermission {
        fn status(&self) -> PermissionStatus {
            PermissionStatus::Restricted
        }

        async fn request_access(&self) -> bool {
            false
        }

        fn open_settings(&self) -> Result<(), PermissionError> {
            Err(PermissionError::Unavailable(
                "the camera API is not supported on this platform".to_owned(),
            ))
        }
    }

    #[derive(Debug)]
    pub(crate) struct UnimplementedDevice;

    impl UnimplementedDevice {
        pub(crate) fn new(_camera_view: &adw::Bin) -> Self {
            Self
        }
    }

    impl CaptureDevice for UnimplementedDevice {
        type Session = UnimplementedSession;

        fn create_session(&self) -> UnimplementedSession {
            UnimplementedSession
        }

        fn default_video_input(&self) -> Result<(), PipelineError> {
            error!("The camera API is not supported on this platform");
            Err(PipelineError::NoCamera)
        }
    }

    #[derive(Debug)]
    pub(crate) struct UnimplementedSession;

    impl CaptureSession for UnimplementedSession {
        type Input = ();

        fn can_add_input(&self, _input: &()) -> bool {
            false
        }

        fn add_input(&mut self, _input: ()) {}

        fn can_add_output(&self, _output: &MetadataOutput) -> bool {
            false
        }

        fn add_output(&mut self, _output: MetadataOutput) {}

        fn attach_preview(&mut self, _layer: PreviewLayer) {}

        fn start_running(&mut self) {}

        fn stop_running(&mut self) {}

        fn is_running(&self) -> bool {
            false
        }
    }
}
