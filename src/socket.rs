//! The TCP socket object and its lifecycle.

use std::io;
use std::rc::Rc;

#[cfg(unix)]
use std::os::unix::io::{AsRawFd, IntoRawFd};
#[cfg(windows)]
use std::os::windows::io::{AsRawSocket, IntoRawSocket};

use socket2::{Domain, Socket as Socket2, Type};

use crate::context::Context;
use crate::endpoint::{Endpoint, Family};
use crate::error::ListenError;
use crate::handle::Handle;

/// A TCP endpoint: owns a [`Handle`], references (not owns) a [`Context`],
/// tracks its address family and a cached local/peer [`Endpoint`]. At most
/// one accept/connect/recv/send may be in flight per direction; read and
/// write directions are independent of each other.
pub struct Socket {
    handle: Handle,
    context: Rc<Context>,
    family: Family,
    endpoint: Endpoint,
}

impl Socket {
    /// Opens a non-blocking stream socket for TCP and registers it with
    /// `context`.
    pub fn new(context: Rc<Context>, family: Family) -> io::Result<Socket> {
        Self::new_with_protocol(context, family, libc_ipproto_tcp())
    }

    /// Opens a stream socket with an explicit L4 protocol.
    pub fn new_with_protocol(
        context: Rc<Context>,
        family: Family,
        protocol: i32,
    ) -> io::Result<Socket> {
        let domain = family.to_domain();
        let protocol = (protocol != 0).then(|| socket2::Protocol::from(protocol));
        let socket2 = Socket2::new(domain, Type::STREAM, protocol)?;
        socket2.set_nonblocking(true)?;
        let handle = into_handle(socket2);
        register(&context, &handle)?;
        Ok(Socket {
            handle,
            context,
            family,
            endpoint: Endpoint::Unset,
        })
    }

    /// Wraps an already-open, already-registered descriptor, used by
    /// `accept` to hand a freshly produced client handle into a new
    /// `Socket`.
    pub(crate) fn from_parts(
        handle: Handle,
        context: Rc<Context>,
        family: Family,
        endpoint: Endpoint,
    ) -> Socket {
        Socket {
            handle,
            context,
            family,
            endpoint,
        }
    }

    /// Turns the socket into a passive listener. `backlog == 0` means
    /// "kernel default" (`SOMAXCONN`).
    ///
    /// On BSD-family targets this additionally sets `SO_LINGER{on_off=1,
    /// linger=0}` immediately after `listen`, for an abortive close on
    /// shutdown of a listening socket (matches those kernels' documented
    /// behavior for prompt port reuse). The setting is applied
    /// best-effort; its result is not reported.
    pub fn listen(&self, backlog: u32) -> Result<(), ListenError> {
        let backlog = if backlog > 0 {
            backlog as i32
        } else {
            libc_somaxconn()
        };
        #[cfg(unix)]
        {
            if unsafe { libc::listen(self.handle.as_raw_fd(), backlog) } < 0 {
                return Err(ListenError::new(io::Error::last_os_error().raw_os_error().unwrap_or(-1)));
            }
        }
        #[cfg(windows)]
        {
            use windows_sys::Win32::Networking::WinSock::{listen, SOCKET};
            if unsafe { listen(self.handle.as_raw_socket() as SOCKET, backlog) } != 0 {
                return Err(ListenError::new(io::Error::last_os_error().raw_os_error().unwrap_or(-1)));
            }
        }
        self.apply_bsd_linger();
        Ok(())
    }

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    ))]
    fn apply_bsd_linger(&self) {
        let data = libc::linger {
            l_onoff: 1,
            l_linger: 0,
        };
        unsafe {
            libc::setsockopt(
                self.handle.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_LINGER,
                &data as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::linger>() as libc::socklen_t,
            );
        }
    }

    #[cfg(not(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    )))]
    fn apply_bsd_linger(&self) {}

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut Endpoint {
        &mut self.endpoint
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub(crate) fn context(&self) -> &Rc<Context> {
        &self.context
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        #[cfg(unix)]
        self.context.forget(self.handle.as_raw_fd());
        #[cfg(windows)]
        {
            let _ = &self.context;
        }
    }
}

#[cfg(unix)]
fn into_handle(socket: Socket2) -> Handle {
    unsafe { Handle::from_raw(socket.into_raw_fd()) }
}

#[cfg(windows)]
fn into_handle(socket: Socket2) -> Handle {
    unsafe { Handle::from_raw(socket.into_raw_socket()) }
}

#[cfg(unix)]
fn register(context: &Rc<Context>, _handle: &Handle) -> io::Result<()> {
    // The readiness backend arms interests lazily in `queue_recv`/
    // `queue_send`; nothing to do eagerly at registration time beyond what
    // `Context` already tracks per fd.
    let _ = context;
    Ok(())
}

#[cfg(windows)]
fn register(context: &Rc<Context>, handle: &Handle) -> io::Result<()> {
    context.associate(handle.as_raw_socket())
}

#[cfg(unix)]
fn libc_ipproto_tcp() -> i32 {
    libc::IPPROTO_TCP
}
#[cfg(windows)]
fn libc_ipproto_tcp() -> i32 {
    6 // IPPROTO_TCP
}

#[cfg(unix)]
fn libc_somaxconn() -> i32 {
    libc::SOMAXCONN
}
#[cfg(windows)]
fn libc_somaxconn() -> i32 {
    windows_sys::Win32::Networking::WinSock::SOMAXCONN as i32
}
