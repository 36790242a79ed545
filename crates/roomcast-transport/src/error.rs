/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or accepting a TCP stream failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The peer connected but the WebSocket upgrade did not complete
    /// (wrong path, malformed request, handshake timeout).
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
}

impl TransportError {
    /// Returns `true` for errors caused by a single misbehaving peer.
    ///
    /// The accept loop keeps running after these; they are logged at a
    /// lower level than listener failures.
    pub fn is_peer_error(&self) -> bool {
        matches!(self, Self::HandshakeFailed(_))
    }
}
