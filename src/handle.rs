//! Owning wrapper over a kernel socket descriptor: exactly one owner,
//! idempotent close, a moved-from value never closes twice.

use std::io;

#[cfg(unix)]
pub type RawHandle = std::os::unix::io::RawFd;
#[cfg(windows)]
pub type RawHandle = std::os::windows::io::RawSocket;

#[cfg(unix)]
const INVALID: RawHandle = -1;
#[cfg(windows)]
const INVALID: RawHandle = 0;

/// Owns exactly one kernel socket descriptor; closes on drop.
#[derive(Debug)]
pub struct Handle(RawHandle);

impl Handle {
    /// # Safety
    /// `raw` must be a valid, currently-open socket descriptor that no other
    /// `Handle` owns.
    pub unsafe fn from_raw(raw: RawHandle) -> Handle {
        Handle(raw)
    }

    pub fn as_raw(&self) -> RawHandle {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != INVALID
    }

    /// Releases ownership without closing, e.g. when handing a freshly
    /// accepted descriptor into a new `Socket`.
    pub fn into_raw(mut self) -> RawHandle {
        let raw = self.0;
        self.0 = INVALID;
        raw
    }

    fn close(&mut self) {
        if self.0 == INVALID {
            return;
        }
        #[cfg(unix)]
        unsafe {
            libc::close(self.0);
        }
        #[cfg(windows)]
        unsafe {
            windows_sys::Win32::Networking::WinSock::closesocket(
                self.0 as windows_sys::Win32::Networking::WinSock::SOCKET,
            );
        }
        self.0 = INVALID;
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(unix)]
impl std::os::unix::io::AsRawFd for Handle {
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        self.0
    }
}

#[cfg(windows)]
impl std::os::windows::io::AsRawSocket for Handle {
    fn as_raw_socket(&self) -> std::os::windows::io::RawSocket {
        self.0
    }
}

pub(crate) fn io_result_from_handle(raw: RawHandle) -> io::Result<Handle> {
    if raw == INVALID {
        Err(io::Error::last_os_error())
    } else {
        Ok(unsafe { Handle::from_raw(raw) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moved_from_handle_is_invalid_and_closes_once() {
        // A pipe fd gives us something real to close without touching the
        // network stack.
        #[cfg(unix)]
        {
            let mut fds = [0; 2];
            unsafe { assert_eq!(libc::pipe(fds.as_mut_ptr()), 0) };
            let handle = unsafe { Handle::from_raw(fds[0]) };
            assert!(handle.is_valid());
            let raw = handle.into_raw();
            assert_eq!(raw, fds[0]);
            // `handle` has already been consumed by `into_raw`; drop of a
            // fresh Handle over the released raw fd is what actually closes
            // it exactly once.
            let handle2 = unsafe { Handle::from_raw(raw) };
            drop(handle2);
            unsafe {
                libc::close(fds[1]);
            }
        }
    }
}
