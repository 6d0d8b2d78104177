//! `send_some`: writes at most one partial chunk and returns, unlike `send`
//! which loops to drain the whole buffer.

use std::io;
use std::rc::Rc;

use crate::context::Context;
use crate::error::ErrorSlot;
use crate::op::Operation;
use crate::ops::cursor::Cursor;
use crate::socket::Socket;

pub struct SendSome<'s, 'b> {
    socket: &'s Socket,
    context: Rc<Context>,
    cursor: Cursor<'b>,
    error: ErrorSlot,
    #[cfg(windows)]
    windows: super::super::sys::windows::send_some::State,
}

impl<'s, 'b> SendSome<'s, 'b> {
    pub fn new(socket: &'s Socket, buffer: &'b mut [u8]) -> SendSome<'s, 'b> {
        SendSome {
            socket,
            context: Rc::clone(socket.context()),
            cursor: Cursor::new(buffer),
            error: ErrorSlot::new(),
            #[cfg(windows)]
            windows: super::super::sys::windows::send_some::State::new(),
        }
    }
}

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use crate::error::{last_os_error_code, would_block};
    use crate::sys::unix::context::WRITE_BITS;
    use std::os::unix::io::AsRawFd;

    impl<'s, 'b> Operation for SendSome<'s, 'b> {
        type Output = io::Result<usize>;

        fn await_ready(&mut self) -> bool {
            let fd = self.socket.handle().as_raw_fd();
            let buf = self.cursor.remaining();
            let rc = unsafe {
                libc::send(
                    fd,
                    buf.as_ptr() as *const libc::c_void,
                    buf.len(),
                    super::unix_msg_nosignal(),
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
            self.error.set_system(code);
            true
        }

        fn suspend(&mut self) -> bool {
            self.context.queue_send(self.socket.handle().as_raw_fd())
        }

        fn park(&mut self) {
            self.context
                .wait(self.socket.handle().as_raw_fd(), WRITE_BITS);
        }

        fn resume(&mut self) -> bool {
            self.await_ready()
        }

        fn finish(self) -> io::Result<usize> {
            self.error.into_result(self.cursor.transferred())
        }
    }
}

#[cfg(unix)]
#[cfg(target_os = "linux")]
fn unix_msg_nosignal() -> libc::c_int {
    libc::MSG_NOSIGNAL
}
#[cfg(unix)]
#[cfg(not(target_os = "linux"))]
fn unix_msg_nosignal() -> libc::c_int {
    0
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use crate::sys::windows::send_some as win;

    impl<'s, 'b> Operation for SendSome<'s, 'b> {
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
            win::resume(self.socket, &mut self.cursor, &mut self.windows, &mut self.error)
        }

        fn finish(self) -> io::Result<usize> {
            self.error.into_result(self.cursor.transferred())
        }
    }
}
