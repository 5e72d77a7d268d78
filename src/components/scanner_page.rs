use std::rc::Rc;

use adw::{prelude::*, subclass::prelude::*};
use gettextrs::gettext;
use gtk::{glib, glib::clone};
use tracing::debug;

use super::camera::{CameraDevice, CameraPermission};
use crate::{
    scanner::{ScannerController, ScannerEventSender, ScannerPhase, ScannerView},
    spawn,
};

/// The controller of a [`ScannerPage`].
type PageController = ScannerController<CameraPermission, CameraDevice, ScannerPageView>;

/// The widgets of a [`ScannerPage`] updated by the controller.
#[derive(Debug)]
struct ScannerPageView {
    status_label: gtk::Label,
    scan_again_btn: gtk::Button,
}

impl ScannerView for ScannerPageView {
    fn set_status(&self, text: &str) {
        self.status_label.set_label(text);
    }

    fn phase_changed(&self, phase: ScannerPhase) {
        self.scan_again_btn.set_sensitive(matches!(
            phase,
            ScannerPhase::Ready | ScannerPhase::Detected
        ));
    }
}

mod imp {
    use std::cell::{OnceCell, RefCell};

    use super::*;

    #[derive(Default)]
    pub struct ScannerPage {
        /// The container of the camera preview.
        pub(super) camera_view: adw::Bin,
        pub(super) status_label: gtk::Label,
        pub(super) scan_again_btn: gtk::Button,
        pub(super) controller: OnceCell<Rc<PageController>>,
        /// The task loading the scanner and dispatching detections.
        pub(super) task: RefCell<Option<glib::JoinHandle<()>>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ScannerPage {
        const NAME: &'static str = "ScannerPage";
        type Type = super::ScannerPage;
        type ParentType = adw::Bin;

        fn class_init(klass: &mut Self::Class) {
            klass.set_css_name("scanner-page");
            klass.set_accessible_role(gtk::AccessibleRole::Group);
        }
    }

    impl ObjectImpl for ScannerPage {
        fn constructed(&self) {
            self.parent_constructed();
            let obj = self.obj();

            self.camera_view.set_vexpand(true);
            self.camera_view.set_overflow(gtk::Overflow::Hidden);
            self.camera_view.add_css_class("card");
            self.camera_view
                .update_property(&[gtk::accessible::Property::Label(&gettext("Camera"))]);

            self.status_label.set_wrap(true);
            self.status_label.set_wrap_mode(gtk::pango::WrapMode::WordChar);
            self.status_label.set_selectable(true);
            self.status_label.set_justify(gtk::Justification::Center);
            self.status_label.add_css_class("title-3");

            self.scan_again_btn.set_label(&gettext("Scan Again"));
            self.scan_again_btn.set_halign(gtk::Align::Center);
            self.scan_again_btn.set_sensitive(false);
            self.scan_again_btn.add_css_class("pill");
            self.scan_again_btn.add_css_class("suggested-action");
            self.scan_again_btn.connect_clicked(clone!(
                #[weak]
                obj,
                move |_| {
                    obj.scan_again();
                }
            ));

            let content = gtk::Box::builder()
                .orientation(gtk::Orientation::Vertical)
                .spacing(18)
                .margin_top(12)
                .margin_bottom(24)
                .margin_start(12)
                .margin_end(12)
                .build();
            content.append(&self.camera_view);
            content.append(&self.status_label);
            content.append(&self.scan_again_btn);

            obj.set_child(Some(&content));
        }

        fn dispose(&self) {
            if let Some(task) = self.task.take() {
                task.abort();
            }

            if let Some(controller) = self.controller.get() {
                controller.unload();
            }
        }
    }

    impl WidgetImpl for ScannerPage {
        fn map(&self) {
            self.parent_map();

            if let Some(controller) = self.controller.get() {
                controller.appear();
            }
        }

        fn unmap(&self) {
            if let Some(controller) = self.controller.get() {
                controller.disappear();
            }

            self.parent_unmap();
        }
    }

    impl BinImpl for ScannerPage {}

    impl ScannerPage {
        /// Create the controller and start loading it.
        pub(super) fn init(&self, events: ScannerEventSender) {
            let view = ScannerPageView {
                status_label: self.status_label.clone(),
                scan_again_btn: self.scan_again_btn.clone(),
            };
            let controller = Rc::new(ScannerController::new(
                CameraPermission::new(),
                CameraDevice::new(&self.camera_view),
                view,
                events,
            ));

            if self.controller.set(controller.clone()).is_err() {
                debug!("Scanner page was already initialized");
                return;
            }

            // Polled on the main context, so the permission continuation and the
            // detections mutate the widgets from the main thread.
            let task = spawn!(async move {
                controller.load().await;
                controller.dispatch_detections().await;
            });
            self.task.replace(Some(task));
        }
    }
}

glib::wrapper! {
    /// A page showing the camera and the content of the last scanned QR code.
    pub struct ScannerPage(ObjectSubclass<imp::ScannerPage>)
        @extends gtk::Widget, adw::Bin,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget;
}

impl ScannerPage {
    /// Construct a new `ScannerPage` sending its events to the given sender.
    pub fn new(events: ScannerEventSender) -> Self {
        let obj = glib::Object::new::<Self>();
        obj.imp().init(events);
        obj
    }

    /// Send the user to the camera section of the system settings.
    pub fn open_settings(&self) {
        if let Some(controller) = self.imp().controller.get() {
            controller.open_settings();
        }
    }

    /// Clear the result and scan again.
    fn scan_again(&self) {
        if let Some(controller) = self.imp().controller.get() {
            controller.scan_again();
        }
    }
}
