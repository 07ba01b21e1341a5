//! Serve command - runs the KidSpark HTTP server.

use std::{sync::Arc, time::Duration};

use kidspark::{
    Clock, SystemClock,
    api::{self, AppState},
    credential::AdminGate,
    session::SessionManager,
};
use tokio::{
    signal::unix::{SignalKind, signal},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{Instrument, info_span};

use crate::backend::{backend_label, create_database};
use crate::cli::ServeArgs;

/// Run the KidSpark server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = create_database(&args.backend_config).await?;
    let admin = AdminGate::new(&args.admin_password)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(db.clone(), clock, admin);

    let purge = spawn_session_purge(
        state.sessions.clone(),
        Duration::from_secs(args.purge_interval),
    );
    let app = api::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, backend = db.kind().as_str(), "KidSpark server listening");

    println!("KidSpark server started on http://localhost:{}", local_addr.port());
    println!("Datastore: {}", backend_label(&args.backend_config));
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                      - Liveness and backend kind");
    println!("  POST /api/auth/admin/login        - Administrator login");
    println!("  POST /api/auth/verify             - Unlock the learner app for a kid");
    println!("  GET  /api/learn/kids              - Kid selector");
    println!("  GET  /api/learn/progress          - Progress of the logged-in kid");
    println!("  POST /api/learn/progress/{{id}}     - Save lesson progress");
    println!("  *    /api/admin/passwords, /kids  - Management (administrator)");
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
                _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
            }
        })
        .await?;

    purge.abort();
    db.close().await;
    println!("Server shut down");
    Ok(())
}

/// Periodically delete expired admin and kid sessions.
fn spawn_session_purge(sessions: SessionManager, every: Duration) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = sessions.purge_expired().await {
                    tracing::warn!(error = %e, "Failed to purge expired sessions");
                }
            }
        }
        .instrument(info_span!("session_purge")),
    )
}
