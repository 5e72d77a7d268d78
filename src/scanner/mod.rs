//! QR code scanner screen controller.
//!
//! The controller drives the camera permission flow and the capture session
//! of a single scanner screen. The platform is reached only through the
//! [`PermissionProvider`], [`CaptureDevice`] and [`ScannerView`] traits.

use std::{
    cell::{Cell, RefCell},
    fmt,
};

use futures_channel::mpsc;
use futures_util::StreamExt;
use tracing::{debug, error, info, trace, warn};

mod capture;
mod permission;
mod tests;

pub(crate) use self::{capture::*, permission::*};
use crate::user_facing_error::UserFacingError;

/// An event sent by the scanner to its coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerEvent {
    /// The user granted access to the camera.
    PermissionGranted,
    /// The permission prompt should be dismissed without access.
    DismissRequested,
}

/// The sender half of the channel receiving [`ScannerEvent`]s.
pub type ScannerEventSender = mpsc::UnboundedSender<ScannerEvent>;

/// The state of the capture pipeline.
pub enum PipelineState<S> {
    /// The pipeline was not built.
    Unconfigured,
    /// The permission is being resolved and the pipeline built.
    Configuring,
    /// The pipeline is built.
    Ready(S),
    /// The pipeline could not be built.
    Failed(PipelineError),
}

impl<S> fmt::Debug for PipelineState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => f.write_str("Unconfigured"),
            Self::Configuring => f.write_str("Configuring"),
            Self::Ready(_) => f.write_str("Ready"),
            Self::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
        }
    }
}

/// The phase of the scanner, as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ScannerPhase {
    /// There is no capture session.
    Idle,
    /// The permission is being resolved and the pipeline built.
    Configuring,
    /// The session is built but stopped.
    Ready,
    /// The session is running.
    Scanning,
    /// A code was detected and the session is stopped.
    Detected,
    /// The session could not be built.
    Failed,
}

/// Trait implemented by the surface presenting the scanner.
pub(crate) trait ScannerView {
    /// Set the text of the status label.
    fn set_status(&self, text: &str);

    /// Called when the phase of the scanner changed.
    fn phase_changed(&self, _phase: ScannerPhase) {}
}

/// The controller of a scanner screen.
pub(crate) struct ScannerController<P, D: CaptureDevice, V> {
    permission: P,
    device: D,
    view: V,
    events: ScannerEventSender,
    pipeline: RefCell<PipelineState<D::Session>>,
    /// The most recently detected payload.
    detected_code: RefCell<Option<String>>,
    detections: RefCell<Option<MetadataReceiver>>,
    /// Whether the screen is visible.
    appeared: Cell<bool>,
    phase: Cell<ScannerPhase>,
}

impl<P, D, V> ScannerController<P, D, V>
where
    P: PermissionProvider,
    D: CaptureDevice,
    V: ScannerView,
{
    /// Construct a new `ScannerController`.
    ///
    /// Nothing happens until [`Self::load()`] is called.
    pub fn new(permission: P, device: D, view: V, events: ScannerEventSender) -> Self {
        Self {
            permission,
            device,
            view,
            events,
            pipeline: RefCell::new(PipelineState::Unconfigured),
            detected_code: Default::default(),
            detections: Default::default(),
            appeared: Default::default(),
            phase: Cell::new(ScannerPhase::Idle),
        }
    }

    /// The current phase of the scanner.
    pub fn phase(&self) -> ScannerPhase {
        match &*self.pipeline.borrow() {
            PipelineState::Unconfigured => ScannerPhase::Idle,
            PipelineState::Configuring => ScannerPhase::Configuring,
            PipelineState::Failed(_) => ScannerPhase::Failed,
            PipelineState::Ready(session) => {
                if session.is_running() {
                    ScannerPhase::Scanning
                } else if self.detected_code.borrow().is_some() {
                    ScannerPhase::Detected
                } else {
                    ScannerPhase::Ready
                }
            }
        }
    }

    /// Whether a capture session is built.
    pub fn has_session(&self) -> bool {
        matches!(*self.pipeline.borrow(), PipelineState::Ready(_))
    }

    /// Resolve the camera permission and build the capture pipeline.
    ///
    /// The returned future must be polled on the main context, the
    /// continuation of the permission request mutates the view.
    pub async fn load(&self) {
        if !matches!(*self.pipeline.borrow(), PipelineState::Unconfigured) {
            debug!("Scanner was already loaded");
            return;
        }

        self.pipeline.replace(PipelineState::Configuring);
        self.notify_phase();

        let status = self.permission.status();
        debug!("Camera permission status: {}", status.as_ref());

        let has_access = match status.action() {
            PermissionAction::Request => {
                let granted = self.permission.request_access().await;

                if granted {
                    info!("Camera access was granted");
                    self.send_event(ScannerEvent::PermissionGranted);
                } else {
                    info!("Camera access was refused");
                    self.send_event(ScannerEvent::DismissRequested);
                }

                granted
            }
            PermissionAction::OpenSettings => {
                self.open_settings();
                false
            }
            PermissionAction::None => {
                if status == PermissionStatus::Restricted {
                    warn!("Camera access is restricted on this system");
                }
                status == PermissionStatus::Granted
            }
        };

        if has_access {
            self.setup_pipeline();

            if self.appeared.get() {
                self.start_scanning();
            }
        } else {
            self.pipeline.replace(PipelineState::Unconfigured);
        }

        self.notify_phase();
    }

    /// Build the capture pipeline and store the result.
    fn setup_pipeline(&self) {
        let state = match self.build_session() {
            Ok(session) => PipelineState::Ready(session),
            Err(error) => {
                error!("Could not set up the camera: {error}");
                self.view.set_status(&error.to_user_facing());
                PipelineState::Failed(error)
            }
        };

        self.pipeline.replace(state);
    }

    fn build_session(&self) -> Result<D::Session, PipelineError> {
        let mut session = self.device.create_session();

        let input = self.device.default_video_input()?;
        if !session.can_add_input(&input) {
            return Err(PipelineError::InputRejected);
        }
        session.add_input(input);

        let (sender, receiver) = mpsc::unbounded();
        let output = MetadataOutput::qr(sender);
        if !session.can_add_output(&output) {
            return Err(PipelineError::OutputRejected);
        }
        session.add_output(output);
        self.detections.replace(Some(receiver));

        session.attach_preview(PreviewLayer::default());

        Ok(session)
    }

    /// The screen is shown.
    pub fn appear(&self) {
        self.appeared.set(true);
        self.start_scanning();
    }

    /// The screen is hidden.
    pub fn disappear(&self) {
        self.appeared.set(false);
        self.stop_scanning();
    }

    /// Start the capture session, if it is not running.
    pub fn start_scanning(&self) {
        if let PipelineState::Ready(session) = &mut *self.pipeline.borrow_mut()
            && !session.is_running()
        {
            debug!("Starting capture session");
            session.start_running();
        }

        self.notify_phase();
    }

    /// Stop the capture session, if it is running.
    pub fn stop_scanning(&self) {
        if let PipelineState::Ready(session) = &mut *self.pipeline.borrow_mut()
            && session.is_running()
        {
            debug!("Stopping capture session");
            session.stop_running();
        }

        self.notify_phase();
    }

    /// Handle a batch of objects detected by the metadata output.
    ///
    /// Only the first object of the batch is considered.
    ///
    /// Batches reaching a stopped session were queued before it stopped and
    /// are dropped.
    pub fn handle_detection(&self, objects: &[MetadataObject]) {
        let running = matches!(
            &*self.pipeline.borrow(),
            PipelineState::Ready(session) if session.is_running()
        );
        if !running {
            debug!("Ignoring detection while the capture session is stopped");
            return;
        }

        self.stop_scanning();

        let Some(object) = objects.first() else {
            return;
        };
        let Some(code) = object.string_value() else {
            trace!("Ignoring metadata object without payload: {object:?}");
            return;
        };

        debug!("Detected code of {} bytes", code.len());
        self.detected_code.replace(Some(code.to_owned()));
        self.view.set_status(code);

        self.notify_phase();
    }

    /// Clear the result and scan again.
    pub fn scan_again(&self) {
        if !self.has_session() {
            return;
        }

        self.detected_code.take();
        self.view.set_status("");

        self.start_scanning();
    }

    /// Send the user to the camera section of the system settings.
    pub fn open_settings(&self) {
        if let Err(error) = self.permission.open_settings() {
            warn!("Could not redirect to the camera settings: {error}");
        }
    }

    /// Forward the batches of the metadata output to
    /// [`Self::handle_detection()`].
    ///
    /// Batches are handled on the context polling the returned future. It
    /// returns when the pipeline is torn down.
    pub async fn dispatch_detections(&self) {
        let Some(mut receiver) = self.detections.take() else {
            return;
        };

        while let Some(batch) = receiver.next().await {
            self.handle_detection(&batch);
        }

        debug!("Metadata output was closed");
    }

    /// Stop and drop the capture session.
    pub fn unload(&self) {
        self.stop_scanning();
        self.pipeline.replace(PipelineState::Unconfigured);
        self.detections.take();
        self.notify_phase();
    }

    /// Send the given event to the coordinator.
    fn send_event(&self, event: ScannerEvent) {
        if self.events.unbounded_send(event).is_err() {
            debug!("Scanner coordinator is gone, dropping {event:?}");
        }
    }

    /// Notify the view if the phase changed.
    fn notify_phase(&self) {
        let phase = self.phase();

        if self.phase.replace(phase) != phase {
            trace!("Scanner phase is now {}", phase.as_ref());
            self.view.phase_changed(phase);
        }
    }
}

impl<P, D: CaptureDevice, V> fmt::Debug for ScannerController<P, D, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerController")
            .field("pipeline", &self.pipeline)
            .field("detected_code", &self.detected_code)
            .field("appeared", &self.appeared)
            .finish_non_exhaustive()
    }
}
