//! Process lifecycle: signal handling and bounded shutdown.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::client::RpcClient;

/// Signals the process reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Quit,
    Hangup,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
        };
        f.write_str(name)
    }
}

impl Signal {
    /// Hangup only requests a reload; everything else stops the process.
    pub fn is_shutdown(self) -> bool {
        !matches!(self, Signal::Hangup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The client closed within the grace period.
    Clean,
    /// The grace period elapsed first.
    Forced,
}

impl ShutdownOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownOutcome::Clean => 0,
            ShutdownOutcome::Forced => 1,
        }
    }
}

/// Source of process signals.
pub trait SignalSource {
    fn recv(&mut self) -> impl Future<Output = Signal> + Send;
}

#[cfg(unix)]
pub struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }
}

#[cfg(unix)]
impl SignalSource for Signals {
    async fn recv(&mut self) -> Signal {
        tokio::select! {
            _ = self.interrupt.recv() => Signal::Interrupt,
            _ = self.terminate.recv() => Signal::Terminate,
            _ = self.quit.recv() => Signal::Quit,
            _ = self.hangup.recv() => Signal::Hangup,
        }
    }
}

#[cfg(not(unix))]
pub struct Signals;

#[cfg(not(unix))]
impl Signals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
impl SignalSource for Signals {
    async fn recv(&mut self) -> Signal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Signal::Interrupt,
            Err(e) => {
                tracing::error!(error = %e, "ctrl-c handler failed");
                Signal::Terminate
            }
        }
    }
}

/// Waits until a shutdown signal arrives. Hangups are logged and ignored.
pub async fn wait_for_shutdown<S: SignalSource>(signals: &mut S) -> Signal {
    loop {
        let sig = signals.recv().await;
        tracing::info!(signal = %sig, "got signal");
        if sig.is_shutdown() {
            return sig;
        }
        tracing::info!("reload is not supported, ignoring");
    }
}

/// Closes the client, giving up once `grace` has elapsed.
pub async fn shutdown(client: &RpcClient, grace: Duration) -> ShutdownOutcome {
    match tokio::time::timeout(grace, client.close()).await {
        Ok(()) => {
            tracing::info!("app exit now...");
            ShutdownOutcome::Clean
        }
        Err(_) => {
            tracing::warn!(grace_secs = grace.as_secs_f64(), "app exit now by force...");
            ShutdownOutcome::Forced
        }
    }
}
