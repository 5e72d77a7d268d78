//! Build-time configuration.
//!
//! Every value can be overridden with an environment variable of the same
//! name, prefixed with `QR_SCANNER_`, when building.

/// Unwrap an optional build-time environment variable.
macro_rules! env_or {
    ($name:literal, $default:literal) => {
        match option_env!($name) {
            Some(value) => value,
            None => $default,
        }
    };
}

/// The application ID.
pub const APP_ID: &str = env_or!("QR_SCANNER_APP_ID", "io.github.QrScanner");
/// The name of the application shown to the user.
pub const APP_NAME: &str = "QR Scanner";
/// The gettext domain of the translations.
pub const GETTEXT_PACKAGE: &str = env_or!("QR_SCANNER_GETTEXT_PACKAGE", "qr-scanner");
/// The directory containing the translations.
pub const LOCALEDIR: &str = env_or!("QR_SCANNER_LOCALEDIR", "/usr/share/locale");
/// The version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// The log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "qr_scanner=info,warn";
/// The command opening the camera privacy settings.
pub const CAMERA_SETTINGS_COMMAND: &str = env_or!(
    "QR_SCANNER_CAMERA_SETTINGS_COMMAND",
    "gnome-control-center camera"
);
