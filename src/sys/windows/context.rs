//! The completion-based reactor: a single I/O completion port shared by every
//! [`crate::socket::Socket`] built against this `Context`. The `ConnectEx`
//! function pointer every `connect` needs is resolved separately, once per
//! process, in the module-level cache below.
//!
//! Because the core has no executor of its own, `park` simply blocks on
//! `GetQueuedCompletionStatus`. The calling operation is the only one
//! parked at a time (`drive` blocks the caller until its own operation
//! finishes), so whichever completion wakes the call is assumed to be that
//! operation's; the operation itself confirms this with `GetOverlappedResult`
//! rather than trusting the completion packet's payload.

use std::io;
use std::os::windows::io::RawSocket;
use std::rc::Rc;
use std::sync::OnceLock;

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Networking::WinSock::{
    WSAIoctl, LPFN_CONNECTEX, SIO_GET_EXTENSION_FUNCTION_POINTER, SOCKET, WSAID_CONNECTEX,
};
use windows_sys::Win32::System::IO::{CreateIoCompletionPort, GetQueuedCompletionStatus, OVERLAPPED};

/// `ConnectEx` is resolved once per process and cached for good: the
/// function pointer is the same for every socket, and a failed resolution
/// (an ancient Winsock without the extension) isn't going to start
/// succeeding on the next socket. `OnceLock` gives that sticky,
/// process-wide cache without tying it to any one `Context`.
static CONNECT_EX: OnceLock<Result<usize, i32>> = OnceLock::new();

pub struct Context {
    port: HANDLE,
}

impl Context {
    pub fn new() -> io::Result<Rc<Context>> {
        let port = unsafe { CreateIoCompletionPort(INVALID_HANDLE_VALUE, std::ptr::null_mut(), 0, 0) };
        if port.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Rc::new(Context { port }))
    }

    /// Associates `socket` with this port. Every socket must be associated
    /// exactly once, before its first overlapped operation is issued.
    pub(crate) fn associate(&self, socket: RawSocket) -> io::Result<()> {
        let rc = unsafe {
            CreateIoCompletionPort(socket as HANDLE, self.port, socket as usize, 0)
        };
        if rc.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub(crate) fn park(&self, _overlapped: *mut OVERLAPPED) {
        let mut bytes: u32 = 0;
        let mut key: usize = 0;
        let mut entry: *mut OVERLAPPED = std::ptr::null_mut();
        unsafe {
            GetQueuedCompletionStatus(self.port, &mut bytes, &mut key, &mut entry, u32::MAX);
        }
    }

}

/// Resolves `ConnectEx` via `WSAIoctl` the first time any socket in the
/// process needs it, using `socket` as the scratch handle the ioctl is
/// issued against, then caches the result (success or failure) for every
/// later caller.
pub(crate) fn connect_ex(socket: SOCKET) -> Result<LPFN_CONNECTEX, i32> {
    *CONNECT_EX
        .get_or_init(|| {
            let mut function: LPFN_CONNECTEX = None;
            let guid = WSAID_CONNECTEX;
            let mut returned: u32 = 0;
            let rc = unsafe {
                WSAIoctl(
                    socket,
                    SIO_GET_EXTENSION_FUNCTION_POINTER,
                    &guid as *const _ as *const core::ffi::c_void,
                    std::mem::size_of_val(&guid) as u32,
                    &mut function as *mut _ as *mut core::ffi::c_void,
                    std::mem::size_of::<LPFN_CONNECTEX>() as u32,
                    &mut returned,
                    std::ptr::null_mut(),
                    None,
                )
            };
            if rc != 0 {
                Err(unsafe { windows_sys::Win32::Networking::WinSock::WSAGetLastError() })
            } else {
                Ok(function.map(|f| f as usize).unwrap_or(0))
            }
        })
        .map(|addr| unsafe { std::mem::transmute::<usize, LPFN_CONNECTEX>(addr) })
}

impl Drop for Context {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.port);
        }
    }
}
