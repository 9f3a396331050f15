// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for engine operations.
//!
//! The engine has no fatal states: everything here is a recoverable,
//! caller-visible condition. Two conditions that look like errors are
//! deliberately *not* represented: an RDM response timeout (zero bytes at
//! window expiry is the positive "empty branch" signal discovery relies on)
//! and a discovery-response checksum mismatch (that is a collision and
//! drives branch splitting). Both stay internal to the state machines.

/// Errors returned by rdmx operations.
///
/// # Example
///
/// ```rust
/// use rdmx::{Error, Result};
///
/// fn check(r: Result<()>) {
///     match r {
///         Err(Error::QueueFull) => { /* retry next tick */ }
///         Err(e) => println!("rdm error: {}", e),
///         Ok(()) => {}
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Backpressure
    // ========================================================================
    /// RDM command queue is full. Natural backpressure: retry on a later
    /// tick once the in-flight transaction resolves.
    QueueFull,

    // ========================================================================
    // State errors
    // ========================================================================
    /// Operation is not valid for the port's current mode (e.g. enabling
    /// RDM on a port switched to DMX input, or writing channels to an
    /// input-mode port).
    InvalidState,
    /// RDM requested on a port whose transport has no RS-485 direction
    /// control; the line can never be turned around for responses.
    DirectionControlRequired,

    // ========================================================================
    // Argument errors
    // ========================================================================
    /// Channel write outside slots 1..=512, or an empty span.
    ChannelRange,
    /// RDM parameter data longer than the 231-byte E1.20 maximum.
    ParameterTooLong,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::QueueFull => write!(f, "RDM command queue full"),
            Error::InvalidState => write!(f, "operation invalid in current port state"),
            Error::DirectionControlRequired => {
                write!(f, "RDM requires a transport with direction control")
            }
            Error::ChannelRange => write!(f, "channel span outside 1..=512"),
            Error::ParameterTooLong => write!(f, "RDM parameter data exceeds 231 bytes"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::QueueFull.to_string(), "RDM command queue full");
        assert!(Error::DirectionControlRequired
            .to_string()
            .contains("direction control"));
    }

    #[test]
    fn test_error_is_std_error() {
        fn takes_err(_e: &dyn std::error::Error) {}
        takes_err(&Error::QueueFull);
    }
}
