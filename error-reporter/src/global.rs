//! Process-wide panic capture
//!
//! Scope: one `std::panic` hook for the whole process, installed at most once.
//! The hook reports the panic, calls the completion callback, then chains to
//! whichever hook was installed before it. There is no uninstall.
//!
//! Panics raised while a request is inside [`request_scope`] are skipped:
//! the request hook catches those and reports them with request context.

use error_common::PanicError;
use std::future::Future;
use std::panic::{self, Location};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::{EventId, PatchCallback, PatchOutcome};
use crate::error::Result;

static INSTALLED: AtomicBool = AtomicBool::new(false);

tokio::task_local! {
    static REQUEST_SCOPE: ();
}

/// Run `future` with its panics left to the caller's `catch_unwind`
pub(crate) async fn request_scope<F: Future>(future: F) -> F::Output {
    REQUEST_SCOPE.scope((), future).await
}

fn in_request_scope() -> bool {
    REQUEST_SCOPE.try_with(|_| ()).is_ok()
}

/// Install the panic hook. Returns `false` if one was already installed by
/// an earlier call, in which case `report` and `on_complete` are dropped.
pub(crate) fn install_panic_hook<F>(report: F, on_complete: PatchCallback) -> bool
where
    F: Fn(PanicError) -> Result<EventId> + Send + Sync + 'static,
{
    if INSTALLED.swap(true, Ordering::SeqCst) {
        tracing::warn!("Global panic hook already installed; ignoring repeated patch request");
        return false;
    }

    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if in_request_scope() {
            previous(info);
            return;
        }

        let error = panic_error(info.payload(), info.location());
        let message = error.message.clone();

        let outcome = match report(error) {
            Ok(event_id) => PatchOutcome {
                sent: true,
                event_id: Some(event_id),
                message,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to report uncaught panic");
                PatchOutcome {
                    sent: false,
                    event_id: None,
                    message,
                }
            }
        };
        on_complete(outcome);

        previous(info);
    }));

    tracing::info!("Global panic hook installed");
    true
}

fn panic_error(payload: &(dyn std::any::Any + Send), location: Option<&Location<'_>>) -> PanicError {
    let mut error = PanicError::from_payload(payload);
    if let Some(location) = location {
        error.message = format!(
            "{} at {}:{}:{}",
            error.message,
            location.file(),
            location.line(),
            location.column()
        );
    }
    error
}
