//! The readiness-backend `Context`: one `epoll` instance per reactor,
//! arming one-shot readable/writable interests on behalf of operations and
//! blocking the driving thread until they fire.
//!
//! This is a minimal but real reactor rather than a mock, sufficient to
//! drive the state machines in [`crate::ops`] and to exercise their
//! end-to-end behavior in tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::os::unix::io::RawFd;
use std::rc::Rc;

use super::selector::Selector;

const READABLE: u32 = libc::EPOLLIN as u32;
const WRITABLE: u32 = libc::EPOLLOUT as u32;

pub struct Context {
    selector: Selector,
    registered: RefCell<HashSet<RawFd>>,
    /// Readiness bits observed for a fd but not yet claimed by a waiter.
    pending: RefCell<HashMap<RawFd, u32>>,
}

impl Context {
    pub fn new() -> io::Result<Rc<Context>> {
        Ok(Rc::new(Context {
            selector: Selector::new()?,
            registered: RefCell::new(HashSet::new()),
            pending: RefCell::new(HashMap::new()),
        }))
    }

    fn arm(&self, fd: RawFd, bits: u32) -> bool {
        let mut registered = self.registered.borrow_mut();
        let result = if registered.contains(&fd) {
            self.selector.modify(fd, fd as u64, bits)
        } else {
            let result = self.selector.add(fd, fd as u64, bits);
            if result.is_ok() {
                registered.insert(fd);
            }
            result
        };
        if let Err(ref err) = result {
            #[cfg(feature = "log")]
            log::debug!("failed to arm fd {fd} for {bits:#x}: {err}");
        }
        result.is_ok()
    }

    /// Arms a one-shot readable notification. Returns `true` on successful
    /// arm, `false` on immediate error.
    pub(crate) fn queue_recv(&self, fd: RawFd) -> bool {
        self.arm(fd, READABLE)
    }

    /// Arms a one-shot writable notification.
    pub(crate) fn queue_send(&self, fd: RawFd) -> bool {
        self.arm(fd, WRITABLE)
    }

    /// Blocks until `fd` reports at least one of `want_bits`, discarding
    /// (but remembering, for a later waiter) readiness reported for
    /// directions nobody asked for yet.
    pub(crate) fn wait(&self, fd: RawFd, want_bits: u32) {
        loop {
            if let Some(bits) = self.pending.borrow_mut().remove(&fd) {
                if bits & want_bits != 0 {
                    return;
                }
                // Readiness for a direction nobody's waiting on yet; drop it,
                // the next `queue_*` call for that direction will re-arm.
            }
            match self.selector.wait(None) {
                Ok(events) => {
                    let mut pending = self.pending.borrow_mut();
                    for event in events {
                        *pending.entry(event.token as RawFd).or_insert(0) |= event.bits;
                    }
                }
                Err(err) => {
                    #[cfg(feature = "log")]
                    log::debug!("epoll_wait failed: {err}");
                    return;
                }
            }
        }
    }

    /// Drops bookkeeping for `fd`. Must be called before the fd is closed
    /// and before its number can be reused by a new socket, or a later
    /// `queue_*` on the reused fd would wrongly `MOD` an entry that no
    /// longer exists in the epoll set.
    pub(crate) fn forget(&self, fd: RawFd) {
        if self.registered.borrow_mut().remove(&fd) {
            let _ = self.selector.remove(fd);
        }
        self.pending.borrow_mut().remove(&fd);
    }
}

pub(crate) const READ_BITS: u32 = READABLE;
pub(crate) const WRITE_BITS: u32 = WRITABLE;
