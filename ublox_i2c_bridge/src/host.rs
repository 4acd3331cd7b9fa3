use std::io::{self, ErrorKind, Read};

/// The host side input: a byte stream that can be polled without blocking.
pub trait HostInput {
    /// Returns the next byte if one is available right now.
    ///
    /// `Ok(None)` means "nothing to read at the moment", it is not an end of
    /// stream: the bridge keeps polling.
    fn try_read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Adapts a reader that was put in non-blocking mode (or has a zero read
/// timeout) to [`HostInput`].
///
/// `WouldBlock`, `TimedOut` and end of file all map to `Ok(None)`,
/// `Interrupted` reads are retried.
pub struct NonBlocking<R> {
    inner: R,
}

impl<R: Read> NonBlocking<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> HostInput for NonBlocking<R> {
    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None)
                },
                Err(e) => return Err(e),
            }
        }
    }
}

impl<T: HostInput + ?Sized> HostInput for &mut T {
    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).try_read_byte()
    }
}

impl<T: HostInput + ?Sized> HostInput for Box<T> {
    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).try_read_byte()
    }
}
