//! Collection of macros.

/// Spawn a future on the default `MainContext`.
///
/// This was meant to be used with `glib::clone!`.
#[macro_export]
macro_rules! spawn {
    ($future:expr) => {
        {
            let ctx = gtk::glib::MainContext::default();
            ctx.spawn_local($future)
        }
    };
    ($priority:expr, $future:expr) => {
        {
            let ctx = gtk::glib::MainContext::default();
            ctx.spawn_local_with_priority($priority, $future)
        }
    };
}

/// Spawn a future on the tokio runtime.
///
/// The future runs on a worker thread, await the returned handle to get its
/// output back on the calling context.
#[macro_export]
macro_rules! spawn_tokio {
    ($future:expr) => {
        $crate::RUNTIME.spawn($future)
    };
}
