//! `recv`.

use std::io;
use std::rc::Rc;

use crate::context::Context;
use crate::error::ErrorSlot;
use crate::op::Operation;
use crate::ops::cursor::Cursor;
use crate::socket::Socket;

/// Reads up to `buffer.len()` bytes from `socket` into `buffer`.
///
/// A peer's orderly close and an `ECONNRESET` both normalize to `Ok(0)` —
/// from the caller's perspective a reset looks like end of stream, not an
/// error.
pub struct Recv<'s, 'b> {
    socket: &'s Socket,
    context: Rc<Context>,
    cursor: Cursor<'b>,
    error: ErrorSlot,
    #[cfg(windows)]
    windows: super::super::sys::windows::recv::State,
}

impl<'s, 'b> Recv<'s, 'b> {
    pub fn new(socket: &'s Socket, buffer: &'b mut [u8]) -> Recv<'s, 'b> {
        Recv {
            socket,
            context: Rc::clone(socket.context()),
            cursor: Cursor::new(buffer),
            error: ErrorSlot::new(),
            #[cfg(windows)]
            windows: super::super::sys::windows::recv::State::new(),
        }
    }
}

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use crate::error::{is_conn_reset, last_os_error_code, would_block};
    use crate::sys::unix::context::READ_BITS;
    use std::os::unix::io::AsRawFd;

    impl<'s, 'b> Operation for Recv<'s, 'b> {
        type Output = io::Result<usize>;

        fn await_ready(&mut self) -> bool {
            let fd = self.socket.handle().as_raw_fd();
            let buf = self.cursor.remaining_mut();
            let rc = unsafe {
                libc::recv(
                    fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                )
            };
            if rc >= 0 {
                self.cursor.advance(rc as usize);
                return true;
            }
            let code = last_os_error_code();
            if would_block(code) {
                return false;
            }
            if is_conn_reset(code) {
                // Leaves the cursor at 0 transferred: an orderly-close read.
                return true;
            }
            self.error.set_system(code);
            true
        }

        fn suspend(&mut self) -> bool {
            self.context.queue_recv(self.socket.handle().as_raw_fd())
        }

        fn park(&mut self) {
            self.context
                .wait(self.socket.handle().as_raw_fd(), READ_BITS);
        }

        fn resume(&mut self) -> bool {
            self.await_ready()
        }

        fn finish(self) -> io::Result<usize> {
            self.error.into_result(self.cursor.transferred())
        }
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use crate::sys::windows::recv as win;

    impl<'s, 'b> Operation for Recv<'s, 'b> {
        type Output = io::Result<usize>;

        fn await_ready(&mut self) -> bool {
            false
        }

        fn suspend(&mut self) -> bool {
            win::suspend(self.socket, &mut self.cursor, &mut self.windows, &mut self.error)
        }

        fn park(&mut self) {
            win::park(&self.context, &mut self.windows);
        }

        fn resume(&mut self) -> bool {
            win::resume(&mut self.cursor, &mut self.windows, self.socket, &mut self.error)
        }

        fn finish(self) -> io::Result<usize> {
            self.error.into_result(self.cursor.transferred())
        }
    }
}
