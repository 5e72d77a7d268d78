use adw::prelude::*;
use gtk::glib;
use tracing::debug;

use crate::scanner::{
    CaptureDevice, CaptureSession, MetadataObject, MetadataOutput, PipelineError, PreviewLayer,
    Symbology,
};

/// Capture through aperture.
#[derive(Debug)]
pub(crate) struct ApertureDevice {
    provider: aperture::DeviceProvider,
    /// The widget hosting the preview.
    camera_view: adw::Bin,
}

impl ApertureDevice {
    pub(crate) fn new(camera_view: &adw::Bin) -> Self {
        Self {
            provider: aperture::DeviceProvider::instance().clone(),
            camera_view: camera_view.clone(),
        }
    }
}

impl CaptureDevice for ApertureDevice {
    type Session = ApertureSession;

    fn create_session(&self) -> ApertureSession {
        ApertureSession {
            viewfinder: Default::default(),
            camera_view: self.camera_view.clone(),
            input: None,
            code_handler: None,
            running: false,
        }
    }

    fn default_video_input(&self) -> Result<ApertureInput, PipelineError> {
        if !self.provider.started() {
            return Err(PipelineError::NoCamera);
        }

        Ok(ApertureInput(self.provider.clone()))
    }
}

/// A started aperture device provider.
///
/// The viewfinder streams the default camera of the provider.
#[derive(Debug)]
pub(crate) struct ApertureInput(aperture::DeviceProvider);

/// A capture session around an aperture viewfinder.
#[derive(Debug)]
pub(crate) struct ApertureSession {
    viewfinder: aperture::Viewfinder,
    camera_view: adw::Bin,
    input: Option<ApertureInput>,
    code_handler: Option<glib::SignalHandlerId>,
    running: bool,
}

impl CaptureSession for ApertureSession {
    type Input = ApertureInput;

    fn can_add_input(&self, input: &ApertureInput) -> bool {
        self.input.is_none() && input.0.started()
    }

    fn add_input(&mut self, input: ApertureInput) {
        self.input = Some(input);
    }

    fn can_add_output(&self, output: &MetadataOutput) -> bool {
        // The viewfinder only recognizes QR codes.
        self.code_handler.is_none()
            && !output.object_types.is_empty()
            && output.object_types.iter().all(|t| *t == Symbology::Qr)
    }

    fn add_output(&mut self, output: MetadataOutput) {
        let sender = output.sender;

        // Signals are emitted on the main context.
        let handler = self.viewfinder.connect_closure(
            "code-detected",
            false,
            glib::closure_local!(move |_: aperture::Viewfinder, code: glib::Bytes| {
                let batch = vec![MetadataObject::qr_code(code.as_ref())];

                if sender.unbounded_send(batch).is_err() {
                    debug!("Metadata receiver is gone, dropping detected code");
                }
            }),
        );

        self.code_handler = Some(handler);
    }

    /// Put the viewfinder in the camera view.
    ///
    /// The viewfinder scales the stream itself, so the preview is not cropped
    /// to fill the view. Only the overflow is clipped.
    fn attach_preview(&mut self, layer: PreviewLayer) {
        self.viewfinder.set_overflow(gtk::Overflow::Hidden);
        self.viewfinder.set_hexpand(layer.fill_view);
        self.viewfinder.set_vexpand(layer.fill_view);

        self.camera_view.set_child(Some(&self.viewfinder));
    }

    fn start_running(&mut self) {
        self.viewfinder.set_detect_codes(true);
        self.running = true;
    }

    fn stop_running(&mut self) {
        // The viewfinder cannot pause its stream, the frames keep flowing to the
        // preview until the session is dropped.
        self.viewfinder.set_detect_codes(false);
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for ApertureSession {
    fn drop(&mut self) {
        if let Some(handler) = self.code_handler.take() {
            self.viewfinder.disconnect(handler);
        }

        self.viewfinder.stop_stream();

        if self
            .camera_view
            .child()
            .is_some_and(|child| &child == self.viewfinder.upcast_ref::<gtk::Widget>())
        {
            self.camera_view.set_child(None::<&gtk::Widget>);
        }
    }
}
