//! Options for key wrapping and unwrapping

use crate::keyset::KeyHandle;

/// Options controlling [`wrap_key`](crate::Crypto::wrap_key) and
/// [`unwrap_key`](crate::Crypto::unwrap_key).
///
/// With no sender the engine runs ECDH-ES. Supplying a sender switches it to
/// ECDH-1PU. The CEK is wrapped with AES-256-GCM unless XChaCha20-Poly1305 is
/// selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapKeyOptions<'a> {
    /// Sender key handle for ECDH-1PU
    sender: Option<&'a KeyHandle>,

    /// Wrap the CEK with XChaCha20-Poly1305
    use_xc20p_kw: bool,
}

impl<'a> WrapKeyOptions<'a> {
    /// Creates options for ECDH-ES with AES-256-GCM key wrapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender key handle, selecting ECDH-1PU.
    ///
    /// Wrapping needs the sender's private key. Unwrapping needs only its
    /// public key, so a public handle is accepted there.
    pub fn with_sender(mut self, sender: &'a KeyHandle) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Selects XChaCha20-Poly1305 key wrapping
    pub fn with_xc20p_kw(mut self) -> Self {
        self.use_xc20p_kw = true;
        self
    }

    /// Applies option transforms in order.
    ///
    /// Transforms of different closure types can be mixed by boxing them as
    /// `Box<dyn FnOnce(WrapKeyOptions) -> WrapKeyOptions>`.
    pub fn apply<I>(self, opts: I) -> Self
    where
        I: IntoIterator,
        I::Item: FnOnce(Self) -> Self,
    {
        opts.into_iter().fold(self, |acc, opt| opt(acc))
    }

    /// Sender key handle, if any
    pub fn sender(&self) -> Option<&'a KeyHandle> {
        self.sender
    }

    /// Whether XChaCha20-Poly1305 key wrapping is selected
    pub fn use_xc20p_kw(&self) -> bool {
        self.use_xc20p_kw
    }
}
