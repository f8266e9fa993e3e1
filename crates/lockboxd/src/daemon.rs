//! Daemon lifecycle: secret provisioning, session store, gate, HTTP server

use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use lockbox_core::config::LockboxConfig;
use lockbox_gate::{CredentialGate, DiagnosticsLog, GateState, MemorySessionStore};
use lockbox_secrets::{SecretProvisioner, SecretSource, SessionSigner};

use crate::metrics::{GateMetrics, HealthState};

pub async fn run(config: LockboxConfig, verbose: bool) -> Result<()> {
    info!("daemon starting");

    // ── Session secret ───────────────────────────────────────────────────
    // Provisioned exactly once, before any request handling starts.
    let provisioner = SecretProvisioner::from_config(&config.session);
    let secret = provisioner.obtain();
    let ephemeral_secret = secret.source() == SecretSource::Generated { persisted: false };
    if ephemeral_secret {
        warn!(
            path = %provisioner.path().display(),
            env = provisioner.env_var(),
            "session secret is not persisted: every restart invalidates all sessions"
        );
    }
    info!(source = ?secret.source(), "session secret ready");

    let signer = SessionSigner::new(&secret);
    drop(secret);
    let sessions = Arc::new(MemorySessionStore::new(
        signer,
        config.session.cookie_name.clone(),
    ));

    // ── Credential gate ──────────────────────────────────────────────────
    let mut registry = Registry::default();
    let gate_metrics = GateMetrics::register(&mut registry);
    let gate = CredentialGate::new(&config.gate)
        .with_observer(Arc::new(DiagnosticsLog::new(verbose)))
        .with_observer(Arc::new(gate_metrics));
    info!(
        verbose,
        upload = ?config.gate.upload_prefixes,
        download = ?config.gate.download_prefixes,
        "credential gate ready"
    );

    // Start Prometheus metrics endpoint
    if let Some(addr) = config.daemon.metrics_addr.clone() {
        let health = HealthState {
            registry: Arc::new(registry),
            ephemeral_secret,
        };
        tokio::spawn(async move {
            if let Err(e) = crate::metrics::serve(addr, health).await {
                error!("metrics server failed: {e}");
            }
        });
    }

    let state = GateState {
        gate: Arc::new(gate),
        sessions,
    };
    let app = crate::routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.daemon.listen)
        .await
        .with_context(|| format!("http bind {}", config.daemon.listen))?;

    notify_ready();
    info!(addr = %config.daemon.listen, "http: listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("http server")?;

    info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(unix)]
fn notify_ready() {
    // Send sd_notify(READY=1) to systemd if running as a service
    // Uses $NOTIFY_SOCKET env var; no-op if not set
    if let Ok(socket) = std::env::var("NOTIFY_SOCKET") {
        match send_notify(&socket) {
            Ok(()) => tracing::debug!(notify_socket = %socket, "sent systemd READY=1"),
            Err(e) => tracing::debug!(notify_socket = %socket, "sd_notify failed: {e}"),
        }
    }
}

#[cfg(not(unix))]
fn notify_ready() {}

#[cfg(unix)]
fn send_notify(socket: &str) -> std::io::Result<()> {
    use std::os::unix::net::UnixDatagram;
    let sock = UnixDatagram::unbound()?;
    sock.send_to(b"READY=1\n", socket)?;
    Ok(())
}
