use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ByteStream;

/// A connected Unix domain socket usable as a command-protocol link.
///
/// Availability is answered with `FIONREAD`; an empty socket whose peer has
/// hung up is reported as [`TransportError::Closed`].
#[derive(Debug)]
pub struct SocketStream {
    inner: UnixStream,
}

impl SocketStream {
    /// Wrap an already connected standard-library stream.
    pub fn from_std(inner: UnixStream) -> Self {
        Self { inner }
    }

    /// Set write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Borrow the underlying socket.
    pub fn get_ref(&self) -> &UnixStream {
        &self.inner
    }

    /// Consume the wrapper and return the socket.
    pub fn into_inner(self) -> UnixStream {
        self.inner
    }

    fn peek_closed(&self) -> Result<bool> {
        let mut probe = 0u8;
        // SAFETY: `probe` is a valid one-byte writable buffer and the descriptor
        // is an open socket owned by `self.inner` for the duration of the call.
        let rc = unsafe {
            libc::recv(
                self.inner.as_raw_fd(),
                (&mut probe as *mut u8).cast::<libc::c_void>(),
                1,
                libc::MSG_PEEK | libc::MSG_DONTWAIT,
            )
        };
        if rc == 0 {
            return Ok(true);
        }
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            return match err.kind() {
                ErrorKind::WouldBlock | ErrorKind::Interrupted => Ok(false),
                _ => Err(TransportError::Io(err)),
            };
        }
        Ok(false)
    }
}

impl ByteStream for SocketStream {
    fn bytes_available(&mut self) -> Result<usize> {
        let mut pending: libc::c_int = 0;
        // SAFETY: FIONREAD writes a single c_int through the provided pointer,
        // which points at a live local.
        let rc = unsafe {
            libc::ioctl(
                self.inner.as_raw_fd(),
                libc::FIONREAD,
                &mut pending as *mut libc::c_int,
            )
        };
        if rc < 0 {
            return Err(TransportError::Io(std::io::Error::last_os_error()));
        }
        if pending > 0 {
            return Ok(pending as usize);
        }
        if self.peek_closed()? {
            return Err(TransportError::Closed);
        }
        Ok(0)
    }

    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(Into::into)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(Into::into)
    }
}

/// Unix domain socket listener.
///
/// Binds a filesystem path, hands out [`SocketStream`]s, and removes the
/// socket file on drop if it is still the one this listener created.
pub struct UnixDomainSocket {
    listener: UnixListener,
    path: PathBuf,
    created_inode: (u64, u64),
}

impl UnixDomainSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// `sockaddr_un.sun_path` is 108 bytes on Linux, 104 elsewhere.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on `path`, replacing a stale socket file if present.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len,
                max: Self::MAX_PATH_LEN,
            });
        }

        let bind_err = |source: std::io::Error| TransportError::Bind {
            path: path.clone(),
            source,
        };

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            path,
            created_inode: (created.dev(), created.ino()),
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<SocketStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "accepted connection");
        Ok(SocketStream::from_std(stream))
    }

    /// Connect to a listening socket (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<SocketStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "connected to unix domain socket");
        Ok(SocketStream::from_std(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        let (dev, ino) = self.created_inode;
        match std::fs::symlink_metadata(&self.path) {
            Ok(metadata)
                if metadata.file_type().is_socket()
                    && metadata.dev() == dev
                    && metadata.ino() == ino =>
            {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            }
            Ok(_) => debug!(path = ?self.path, "socket path replaced; skipping cleanup"),
            Err(_) => {}
        }
    }
}
