//! `connect`.

use std::io;
use std::rc::Rc;

use crate::context::Context;
use crate::endpoint::Endpoint;
use crate::error::ErrorSlot;
use crate::op::Operation;
use crate::socket::Socket;

/// Connects a [`Socket`] to `endpoint`.
pub struct Connect<'s> {
    socket: &'s mut Socket,
    context: Rc<Context>,
    endpoint: Endpoint,
    error: ErrorSlot,
    #[cfg(windows)]
    windows: super::super::sys::windows::connect::State,
}

impl<'s> Connect<'s> {
    pub fn new(socket: &'s mut Socket, endpoint: Endpoint) -> Connect<'s> {
        let context = Rc::clone(socket.context());
        let mut error = ErrorSlot::new();
        #[cfg(windows)]
        let windows = crate::sys::windows::connect::State::new(socket, &mut error);
        *socket.endpoint_mut() = endpoint;
        Connect {
            socket,
            context,
            endpoint,
            error,
            #[cfg(windows)]
            windows,
        }
    }
}

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use crate::error::last_os_error_code;
    use crate::sys::unix::context::WRITE_BITS;
    use crate::sys::unix::net::RawSockAddr;
    use std::os::unix::io::AsRawFd;

    impl<'s> Operation for Connect<'s> {
        type Output = io::Result<()>;

        fn await_ready(&mut self) -> bool {
            let fd = self.socket.handle().as_raw_fd();
            let addr = self
                .endpoint
                .to_socket_addr()
                .expect("connect requires a set destination endpoint");
            let raw = RawSockAddr::from(&addr);
            let (ptr, len) = raw.as_ptr_len();
            loop {
                let rc = unsafe { libc::connect(fd, ptr, len) };
                if rc == 0 {
                    return true;
                }
                let code = last_os_error_code();
                if code == libc::EINPROGRESS {
                    return false;
                }
                if code == libc::EINTR {
                    // Linux restarts `connect` on EINTR; other targets fall
                    // through to suspend instead. Both are correct.
                    #[cfg(target_os = "linux")]
                    continue;
                    #[cfg(not(target_os = "linux"))]
                    return false;
                }
                self.error.set_system(code);
                return true;
            }
        }

        fn suspend(&mut self) -> bool {
            self.context.queue_send(self.socket.handle().as_raw_fd())
        }

        fn park(&mut self) {
            self.context
                .wait(self.socket.handle().as_raw_fd(), WRITE_BITS);
        }

        fn resume(&mut self) -> bool {
            let fd = self.socket.handle().as_raw_fd();
            let mut code: libc::c_int = 0;
            let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
            let rc = unsafe {
                libc::getsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_ERROR,
                    &mut code as *mut _ as *mut libc::c_void,
                    &mut len,
                )
            };
            if rc < 0 {
                self.error.set_last_os_error();
            } else if code != 0 {
                self.error.set_system(code);
            }
            true
        }

        fn finish(self) -> io::Result<()> {
            self.error.into_result(())
        }
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use crate::sys::windows::connect as win;

    impl<'s> Operation for Connect<'s> {
        type Output = io::Result<()>;

        fn await_ready(&mut self) -> bool {
            // The completion backend never has a synchronous connect
            // result; a bind failure from `Connect::new` is instead caught
            // by `suspend`, which short-circuits on an already-set error
            // slot.
            false
        }

        fn suspend(&mut self) -> bool {
            win::suspend(&self.socket, &self.endpoint, &mut self.windows, &mut self.error)
        }

        fn park(&mut self) {
            win::park(&self.context, &mut self.windows);
        }

        fn resume(&mut self) -> bool {
            win::resume(&self.socket, &mut self.windows, &mut self.error)
        }

        fn finish(self) -> io::Result<()> {
            self.error.into_result(())
        }
    }
}
