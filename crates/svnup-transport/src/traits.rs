//! The transport contract the protocol layer drives.

use crate::error::TransportError;

/// A byte-stream channel: blocking send/recv/close over plain TCP or TLS.
///
/// Implementations never retry internally; a `recv` returning `Ok(0)`
/// or an `Err` (other than a transient `EINTR`-equivalent, which is
/// retried inside the implementation) means the caller should treat
/// the connection as dead and, if it wants to continue, reopen a fresh
/// one via [`crate::connect`].
pub trait Transport: Send {
    /// Writes the whole buffer, looping until every byte is sent.
    fn send(&mut self, buf: &[u8]) -> Result<(), TransportError>;

    /// Reads at least one byte into `buf`, returning the number read.
    /// `Ok(0)` means the peer closed the connection.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Closes the underlying socket. Best-effort; errors are not fatal.
    fn close(&mut self);
}
