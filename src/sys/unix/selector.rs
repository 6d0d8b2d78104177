//! Thin `epoll` wrapper: an `OwnedFd`-backed `epoll_create1` instance, with
//! `epoll_ctl`/`epoll_wait` syscalls checked via an inlined error mapping
//! (there's only one selector implementation here, so no shared macro
//! across epoll/kqueue/IOCP is needed).

use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RawEvent {
    pub(crate) token: u64,
    pub(crate) bits: u32,
}

pub(crate) struct Selector {
    ep: OwnedFd,
}

impl Selector {
    pub(crate) fn new() -> io::Result<Selector> {
        // SAFETY: `epoll_create1(2)` returns a valid fd or -1.
        let ep = unsafe { OwnedFd::from_raw_fd(cvt(libc::epoll_create1(libc::EPOLL_CLOEXEC))?) };
        Ok(Selector { ep })
    }

    pub(crate) fn add(&self, fd: RawFd, token: u64, bits: u32) -> io::Result<()> {
        let mut event = libc::epoll_event {
            events: bits | libc::EPOLLONESHOT as u32,
            u64: token,
        };
        cvt(unsafe {
            libc::epoll_ctl(self.ep.as_raw_fd(), libc::EPOLL_CTL_ADD, fd, &mut event)
        })
        .map(|_| ())
    }

    pub(crate) fn modify(&self, fd: RawFd, token: u64, bits: u32) -> io::Result<()> {
        let mut event = libc::epoll_event {
            events: bits | libc::EPOLLONESHOT as u32,
            u64: token,
        };
        cvt(unsafe {
            libc::epoll_ctl(self.ep.as_raw_fd(), libc::EPOLL_CTL_MOD, fd, &mut event)
        })
        .map(|_| ())
    }

    pub(crate) fn remove(&self, fd: RawFd) -> io::Result<()> {
        cvt(unsafe {
            libc::epoll_ctl(
                self.ep.as_raw_fd(),
                libc::EPOLL_CTL_DEL,
                fd,
                std::ptr::null_mut(),
            )
        })
        .map(|_| ())
    }

    /// Blocks until at least one armed interest fires, returning the
    /// (token, readiness-bits) pairs observed.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> io::Result<Vec<RawEvent>> {
        const CAP: usize = 128;
        let mut raw = [libc::epoll_event { events: 0, u64: 0 }; CAP];
        let timeout_ms = timeout
            .map(|d| {
                d.checked_add(Duration::from_nanos(999_999))
                    .unwrap_or(d)
                    .as_millis() as libc::c_int
            })
            .unwrap_or(-1);
        let n = cvt(unsafe {
            libc::epoll_wait(self.ep.as_raw_fd(), raw.as_mut_ptr(), CAP as i32, timeout_ms)
        })?;
        Ok(raw[..n as usize]
            .iter()
            .map(|e| RawEvent {
                token: e.u64,
                bits: e.events,
            })
            .collect())
    }
}
