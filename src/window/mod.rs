use adw::{prelude::*, subclass::prelude::*};
use futures_channel::mpsc;
use futures_util::StreamExt;
use gettextrs::gettext;
use gtk::{gio, glib};
use tracing::{debug, info};


use crate::{
    Application,
    components::ScannerPage,
    config::APP_NAME,
    scanner::ScannerEvent,
    spawn,
};

/// A page of the main window stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum WindowPage {
    /// The scanner.
    Scanner,
    /// The page shown when the camera cannot be accessed.
    NoAccess,
}

/// How the window reacts to an event of the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScannerEventReaction {
    /// The page to show.
    page: WindowPage,
    /// The message of the toast to show, if any.
    toast: Option<String>,
}

impl ScannerEventReaction {
    fn new(event: ScannerEvent) -> Self {
        match event {
            ScannerEvent::PermissionGranted => Self {
                page: WindowPage::Scanner,
                toast: None,
            },
            ScannerEvent::DismissRequested => Self {
                page: WindowPage::NoAccess,
                toast: Some(gettext("Camera access was denied")),
            },
        }
    }
}

mod imp {
    use std::cell::OnceCell;

    use super::*;

    #[derive(Debug, Default)]
    pub struct Window {
        pub(super) main_stack: gtk::Stack,
        pub(super) toast_overlay: adw::ToastOverlay,
        pub(super) scanner_page: OnceCell<ScannerPage>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for Window {
        const NAME: &'static str = "Window";
        type Type = super::Window;
        type ParentType = adw::ApplicationWindow;

        fn class_init(klass: &mut Self::Class) {
            klass.install_action("window.open-camera-settings", None, |obj, _, _| {
                if let Some(scanner_page) = obj.imp().scanner_page.get() {
                    scanner_page.open_settings();
                }
            });
        }
    }

    impl ObjectImpl for Window {
        fn constructed(&self) {
            self.parent_constructed();
            let obj = self.obj();

            obj.set_title(Some(APP_NAME));
            obj.set_default_size(420, 640);

            let (sender, receiver) = mpsc::unbounded();
            let scanner_page = ScannerPage::new(sender);
            self.main_stack
                .add_named(&scanner_page, Some(WindowPage::Scanner.as_ref()));
            self.main_stack
                .add_named(&no_access_page(), Some(WindowPage::NoAccess.as_ref()));
            self.main_stack
                .set_transition_type(gtk::StackTransitionType::Crossfade);
            self.main_stack
                .set_visible_child_name(WindowPage::Scanner.as_ref());
            self.scanner_page
                .set(scanner_page)
                .expect("scanner page is uninitialized");

            self.toast_overlay.set_child(Some(&self.main_stack));

            let header_bar = adw::HeaderBar::new();
            header_bar.pack_end(&primary_menu_button());

            let toolbar_view = adw::ToolbarView::new();
            toolbar_view.add_top_bar(&header_bar);
            toolbar_view.set_content(Some(&self.toast_overlay));
            obj.set_content(Some(&toolbar_view));

            obj.listen_to_scanner_events(receiver);
        }
    }

    impl WidgetImpl for Window {}
    impl WindowImpl for Window {}
    impl ApplicationWindowImpl for Window {}
    impl AdwApplicationWindowImpl for Window {}
}

glib::wrapper! {
    pub struct Window(ObjectSubclass<imp::Window>)
        @extends gtk::Widget, gtk::Window, gtk::ApplicationWindow, adw::ApplicationWindow,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget, gtk::Native, gtk::Root,
            gtk::ShortcutManager, gtk::gio::ActionMap, gtk::gio::ActionGroup;
}

impl Window {
    pub fn new(app: &Application) -> Self {
        glib::Object::builder()
            .property("application", Some(app))
            .build()
    }

    /// The visible page of the window.
    pub fn visible_page(&self) -> Option<WindowPage> {
        self.imp()
            .main_stack
            .visible_child_name()
            .and_then(|name| name.parse().ok())
    }

    /// Set the visible page of the window.
    pub fn set_visible_page(&self, page: WindowPage) {
        self.imp().main_stack.set_visible_child_name(page.as_ref());
    }

    /// Handle the events sent by the scanner until it is dropped.
    fn listen_to_scanner_events(&self, mut receiver: mpsc::UnboundedReceiver<ScannerEvent>) {
        let obj_weak = self.downgrade();

        spawn!(async move {
            while let Some(event) = receiver.next().await {
                let Some(obj) = obj_weak.upgrade() else {
                    break;
                };
                obj.handle_scanner_event(event);
            }

            debug!("Scanner event channel was closed");
        });
    }

    /// Handle the given event sent by the scanner.
    fn handle_scanner_event(&self, event: ScannerEvent) {
        info!("Received scanner event {event:?}");
        let reaction = ScannerEventReaction::new(event);

        if self.visible_page() != Some(reaction.page) {
            self.set_visible_page(reaction.page);
        }

        if let Some(message) = reaction.toast {
            self.imp()
                .toast_overlay
                .add_toast(adw::Toast::new(&message));
        }
    }
}

/// Build the page shown when the camera cannot be accessed.
fn no_access_page() -> adw::StatusPage {
    let settings_btn = gtk::Button::builder()
        .label(gettext("Open Settings"))
        .action_name("window.open-camera-settings")
        .halign(gtk::Align::Center)
        .css_classes(["pill", "suggested-action"])
        .build();

    adw::StatusPage::builder()
        .icon_name("camera-disabled-symbolic")
        .title(gettext("No Camera Access"))
        .description(gettext(
            "Allow this app to use the camera in the privacy settings, then open it again.",
        ))
        .child(&settings_btn)
        .build()
}

/// The entries of the primary menu, as untranslated label and action name.
const PRIMARY_MENU_ENTRIES: [(&str, &str); 2] =
    [("_About QR Scanner", "app.about"), ("_Quit", "app.quit")];

/// Build the button of the primary menu.
fn primary_menu_button() -> gtk::MenuButton {
    let menu = gio::Menu::new();
    for (label, action) in PRIMARY_MENU_ENTRIES {
        menu.append(Some(&gettext(label)), Some(action));
    }

    gtk::MenuButton::builder()
        .icon_name("open-menu-symbolic")
        .tooltip_text(gettext("Main Menu"))
        .menu_model(&menu)
        .primary(true)
        .build()
}
