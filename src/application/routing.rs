//! Routing reconciler
//!
//! Read-modify-write of the shared routing document. Each mutation runs under
//! the host lock, parses the whole document (refusing corrupt ones), changes
//! one site block, writes the result atomically and asks the proxy to reload.
//! An unchanged table is neither written nor reloaded.

use similar::TextDiff;
use thiserror::Error;

use crate::config::LockConfig;
use crate::domain::entities::{RouteChange, RouteTable, RouteTableError};
use crate::domain::ports::{ConvergeEvent, ConvergeEventSink, RemoteExecutor};
use crate::domain::services::commands;
use crate::domain::value_objects::{DomainName, HostLayout};
use crate::error::ExitKind;

use super::host_lock::{HostLock, LockError};
use super::shell::{HostError, HostShell};

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing document is corrupt: {0}")]
    Corrupt(#[from] RouteTableError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("routing document access failed: {0}")]
    Host(#[from] HostError),

    #[error("proxy rejected the new routing document: {0}")]
    Reload(HostError),
}

impl RoutingError {
    pub fn kind(&self) -> ExitKind {
        match self {
            RoutingError::Corrupt(_) => ExitKind::RoutingConflict,
            RoutingError::Lock(e) => e.kind(),
            RoutingError::Host(e) | RoutingError::Reload(e) => {
                e.transport_kind().unwrap_or(ExitKind::InfraNotReady)
            }
        }
    }
}

/// Result of one reconcile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub domain: String,
    pub change: RouteChange,
    /// Unified diff of the document, present when it changed.
    pub diff: Option<String>,
}

pub struct RoutingReconciler<'a, E: RemoteExecutor> {
    executor: &'a E,
    events: &'a dyn ConvergeEventSink,
    layout: &'a HostLayout,
    lock: &'a LockConfig,
}

impl<'a, E: RemoteExecutor> RoutingReconciler<'a, E> {
    pub fn new(
        executor: &'a E,
        events: &'a dyn ConvergeEventSink,
        layout: &'a HostLayout,
        lock: &'a LockConfig,
    ) -> Self {
        Self {
            executor,
            events,
            layout,
            lock,
        }
    }

    /// Route `domain` to `upstream`.
    pub fn upsert_route(
        &self,
        domain: &DomainName,
        upstream: &str,
    ) -> Result<RouteOutcome, RoutingError> {
        self.reconcile(domain, |table| table.upsert(domain, upstream))
    }

    /// Stop routing `domain`; absence is not an error.
    pub fn remove_route(&self, domain: &DomainName) -> Result<RouteOutcome, RoutingError> {
        self.reconcile(domain, |table| table.remove(domain))
    }

    /// Current upstream for `domain`, read without the lock.
    pub fn lookup(&self, domain: &DomainName) -> Result<Option<String>, RoutingError> {
        let text = self.read_document(&self.shell())?;
        Ok(RouteTable::parse(&text)?.upstream(domain))
    }

    fn shell(&self) -> HostShell<'a, E> {
        HostShell::new(self.executor, self.events)
    }

    /// The document as text; bytes that are not UTF-8 count as corruption so
    /// they are never rewritten.
    fn read_document(&self, shell: &HostShell<'a, E>) -> Result<String, RoutingError> {
        match shell.read_file(&self.layout.routing_document()) {
            Ok(text) => Ok(text.unwrap_or_default()),
            Err(HostError::NotText { line, .. }) => Err(RouteTableError::NotUtf8 { line }.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn reconcile(
        &self,
        domain: &DomainName,
        mutate: impl FnOnce(&mut RouteTable) -> Result<RouteChange, RouteTableError>,
    ) -> Result<RouteOutcome, RoutingError> {
        let lock = HostLock::acquire(self.executor, self.events, self.layout, self.lock)?;
        let shell = self.shell();
        let path = self.layout.routing_document();

        let before = self.read_document(&shell)?;
        let mut table = RouteTable::parse(&before)?;
        let change = mutate(&mut table)?;

        let diff = if change.is_mutation() {
            let after = table.render();
            shell.write_file(&path, &after)?;
            shell
                .run_ok(&commands::proxy_reload(
                    &self.layout.proxy_container(),
                    self.layout.proxy_routing_document(),
                ))
                .map_err(RoutingError::Reload)?;
            Some(unified_diff(&before, &after, &path))
        } else {
            None
        };

        lock.release()?;

        self.events.on_event(ConvergeEvent::RouteChanged {
            domain: domain.to_string(),
            change: change.label().to_string(),
            diff: diff.clone(),
        });

        Ok(RouteOutcome {
            domain: domain.to_string(),
            change,
            diff,
        })
    }
}

fn unified_diff(before: &str, after: &str, path: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(2)
        .header(path, path)
        .to_string()
}
