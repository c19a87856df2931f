//! Runs the HTTP server and the fulfillment worker side by side.

use std::future::{Future, IntoFuture};

use axum::Router;
use messaging::MessagingError;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;

use crate::config::Config;
use crate::state::SharedLog;
use crate::worker::{self, HttpFulfillmentSaga};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Fulfillment worker failed: {0}")]
    Worker(#[from] MessagingError),

    #[error("Fulfillment worker panicked: {0}")]
    WorkerPanicked(#[from] JoinError),
}

/// Resolves once `rx` has seen a `true`.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Serves `app` on `listener` and runs the worker until `shutdown` resolves
/// or the worker exits on its own.
///
/// On shutdown the worker is stopped and awaited first: it finishes the
/// message in hand, which may still call the services behind `app`. The
/// server then drains gracefully. A worker failure also stops the server and
/// is returned.
pub async fn run<S>(
    listener: TcpListener,
    app: Router,
    config: Config,
    log: SharedLog,
    saga: HttpFulfillmentSaga,
    shutdown: S,
) -> Result<(), RunError>
where
    S: Future<Output = ()>,
{
    let (worker_stop, worker_stop_rx) = watch::channel(false);
    let mut worker = tokio::spawn(async move {
        worker::run(&config, log, &saga, stopped(worker_stop_rx)).await
    });

    let (server_stop, server_stop_rx) = watch::channel(false);
    let server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(stopped(server_stop_rx))
            .into_future(),
    );

    let exited_early = tokio::select! {
        () = shutdown => None,
        result = &mut worker => Some(result),
    };
    let worker_result = match exited_early {
        Some(result) => result,
        None => {
            tracing::info!("stopping fulfillment worker");
            let _ = worker_stop.send(true);
            worker.await
        }
    };

    tracing::info!("stopping HTTP server");
    let _ = server_stop.send(true);
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "server error"),
        Err(e) => tracing::error!(error = %e, "server task panicked"),
    }

    Ok(worker_result??)
}
