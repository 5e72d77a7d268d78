//! Collection of common methods and types.

use std::{future::Future, time::Duration};

use futures_util::{
    future::{self, Either},
    pin_mut,
};
use gtk::glib;

pub(crate) mod macros;

/// Run the given future with a timeout.
///
/// Returns `Err(())` if the timeout is reached before the future resolves.
pub(crate) async fn timeout_future<T>(
    timeout: Duration,
    fut: impl Future<Output = T>,
) -> Result<T, ()> {
    let timeout = glib::timeout_future(timeout);
    pin_mut!(fut);

    match future::select(fut, timeout).await {
        Either::Left((x, _)) => Ok(x),
        Either::Right(_) => Err(()),
    }
}
