//! Capture session API.

use futures_channel::mpsc;
use thiserror::Error;

/// The sender half of the channel receiving detected metadata.
pub type MetadataSender = mpsc::UnboundedSender<Vec<MetadataObject>>;

/// The receiver half of the channel receiving detected metadata.
pub type MetadataReceiver = mpsc::UnboundedReceiver<Vec<MetadataObject>>;

/// A machine-readable code symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    Qr,
}

/// An object recognized in a frame by a metadata output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataObject {
    /// A machine-readable code.
    Code {
        symbology: Symbology,
        /// The decoded payload, if it could be decoded as a string.
        string_value: Option<String>,
    },
    /// Another kind of object, like a face.
    ///
    /// No backend reports these yet.
    #[cfg(test)]
    Other { kind: String },
}

impl MetadataObject {
    /// Construct a QR code object from its raw payload.
    ///
    /// Payloads that are not valid UTF-8 have no string value.
    pub fn qr_code(payload: &[u8]) -> Self {
        Self::Code {
            symbology: Symbology::Qr,
            string_value: std::str::from_utf8(payload).ok().map(ToOwned::to_owned),
        }
    }

    /// The decoded string of this object, if it is a code with a string
    /// payload.
    pub fn string_value(&self) -> Option<&str> {
        match self {
            Self::Code { string_value, .. } => string_value.as_deref(),
            #[cfg(test)]
            Self::Other { .. } => None,
        }
    }
}

/// An output of a capture session that recognizes codes in frames.
#[derive(Debug)]
pub struct MetadataOutput {
    /// The symbologies to recognize.
    pub object_types: Vec<Symbology>,
    /// Where detected batches are delivered.
    ///
    /// The receiving end is drained on the main context.
    pub sender: MetadataSender,
}

impl MetadataOutput {
    /// Construct an output recognizing only QR codes.
    pub fn qr(sender: MetadataSender) -> Self {
        Self {
            object_types: vec![Symbology::Qr],
            sender,
        }
    }
}

/// A surface rendering the output of a capture session.
///
/// The preview keeps the aspect ratio of the frames and fills its bounds,
/// cropping the overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLayer {
    /// Whether the preview takes the whole camera view.
    pub fill_view: bool,
}

impl Default for PreviewLayer {
    fn default() -> Self {
        Self { fill_view: true }
    }
}

/// An error while building the capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// No video capture device is available.
    #[error("no video capture device is available")]
    NoCamera,
    /// The session does not accept the video input.
    #[error("the capture session does not accept the video input")]
    InputRejected,
    /// The session does not accept the metadata output.
    #[error("the capture session does not accept the metadata output")]
    OutputRejected,
}

/// Trait implemented by capture backends.
pub(crate) trait CaptureDevice {
    /// The type of session built by this backend.
    type Session: CaptureSession;

    /// Create a new, empty and stopped session.
    fn create_session(&self) -> Self::Session;

    /// Get the default video input.
    fn default_video_input(
        &self,
    ) -> Result<<Self::Session as CaptureSession>::Input, PipelineError>;
}

/// Trait implemented by capture sessions.
pub(crate) trait CaptureSession {
    /// The type of the video input of this session.
    type Input;

    /// Whether this session can accept the given input.
    fn can_add_input(&self, input: &Self::Input) -> bool;

    /// Add the given input.
    fn add_input(&mut self, input: Self::Input);

    /// Whether this session can accept the given output.
    fn can_add_output(&self, output: &MetadataOutput) -> bool;

    /// Add the given output.
    fn add_output(&mut self, output: MetadataOutput);

    /// Bind a preview to this session.
    fn attach_preview(&mut self, layer: PreviewLayer);

    /// Start streaming frames and detecting codes.
    fn start_running(&mut self);

    /// Stop streaming frames and detecting codes.
    fn stop_running(&mut self);

    /// Whether this session is running.
    fn is_running(&self) -> bool;
}
