use tracing::{debug, info, warn};

use studypet_core::config::Config;
use studypet_core::logging;
use studypet_core::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config);

    info!(data_dir = %config.data_dir.display(), "studypet core starting");

    let app = AppState::load(config);

    if app.is_first_time_user() {
        info!("no saved pet found, waiting for pet selection");
    } else if let Some(pet) = app.pet().pet_profile() {
        let snapshot = app.pet().snapshot();
        info!(
            pet = %pet.name,
            kind = pet.pet_type.as_str(),
            stage = snapshot.stage.as_str(),
            mastery = snapshot.mastery,
            "loaded saved pet"
        );
    }

    let _log_subscription = app
        .notifier()
        .subscribe(|change| debug!(change = change.as_str(), "pet state changed"));

    let session = app.session();
    session.start();

    let mut status_rx = session.status();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow().clone();
            if status.active {
                debug!(status = %status.describe(), "session status");
            }
        }
    });

    shutdown_signal().await;
    info!("shutdown signal received");

    session.stop().await;
    if let Err(err) = app.flush() {
        warn!(error = %err, "final save failed");
    }
    info!("studypet core stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
