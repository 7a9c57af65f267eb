//! Port allocation
//!
//! Applications are reachable only through the shared network and the proxy,
//! never through host-bound ports, so an explicit port is taken verbatim even
//! if another application already uses the same number. Automatic allocation
//! is a pure function of the ports already recorded in the local workspace;
//! the host is never consulted.

use std::collections::BTreeSet;

use thiserror::Error;

/// First port handed out automatically.
pub const BASE_PORT: u16 = 3000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no free port left at or above {BASE_PORT}")]
pub struct PortsExhausted;

/// Pick the internal port for an application.
///
/// `explicit` wins unconditionally. Otherwise the lowest port at or above
/// [`BASE_PORT`] that is not in `existing` is returned.
pub fn allocate(explicit: Option<u16>, existing: &BTreeSet<u16>) -> Result<u16, PortsExhausted> {
    if let Some(port) = explicit {
        return Ok(port);
    }

    (BASE_PORT..=u16::MAX)
        .find(|p| !existing.contains(p))
        .ok_or(PortsExhausted)
}
