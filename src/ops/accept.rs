//! `accept`.

use std::io;
use std::rc::Rc;

use crate::context::Context;
use crate::endpoint::{Endpoint, Family};
use crate::error::ErrorSlot;
use crate::handle::Handle;
use crate::op::Operation;
use crate::socket::Socket;

/// Accepts one connection on a listening [`Socket`], producing a connected
/// client `Socket` whose endpoint is the peer's address.
pub struct Accept<'s> {
    listener: &'s Socket,
    context: Rc<Context>,
    family: Family,
    client_handle: Option<Handle>,
    client_endpoint: Endpoint,
    error: ErrorSlot,
    #[cfg(windows)]
    windows: super::super::sys::windows::accept::State,
}

impl<'s> Accept<'s> {
    pub fn new(listener: &'s Socket) -> Accept<'s> {
        Accept {
            listener,
            context: Rc::clone(listener.context()),
            family: listener.family(),
            client_handle: None,
            client_endpoint: Endpoint::Unset,
            error: ErrorSlot::new(),
            #[cfg(windows)]
            windows: super::super::sys::windows::accept::State::new(),
        }
    }
}

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use crate::error::{last_os_error_code, would_block};
    use crate::sys::unix::context::READ_BITS;
    use crate::sys::unix::net::endpoint_from_sockaddr;
    use std::os::unix::io::AsRawFd;

    impl<'s> Operation for Accept<'s> {
        type Output = io::Result<Socket>;

        fn await_ready(&mut self) -> bool {
            if self.error.is_set() {
                return true;
            }
            let listener_fd = self.listener.handle().as_raw_fd();
            let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
            let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
            let raw = unsafe {
                libc::accept4(
                    listener_fd,
                    &mut storage as *mut _ as *mut libc::sockaddr,
                    &mut len,
                    libc::SOCK_NONBLOCK,
                )
            };
            if raw >= 0 {
                // accept4(SOCK_NONBLOCK) is mandatory here: it sets
                // non-blocking atomically, avoiding the descriptor-leak
                // window a separate `fcntl` call would open.
                self.client_handle = Some(unsafe { Handle::from_raw(raw) });
                self.client_endpoint = unsafe { endpoint_from_sockaddr(&storage) };
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
            self.context.queue_recv(self.listener.handle().as_raw_fd())
        }

        fn park(&mut self) {
            self.context
                .wait(self.listener.handle().as_raw_fd(), READ_BITS);
        }

        fn resume(&mut self) -> bool {
            self.await_ready()
        }

        fn finish(self) -> io::Result<Socket> {
            match self.error.into_result(()) {
                Ok(()) => {
                    let handle = self
                        .client_handle
                        .expect("accept succeeded without a client handle");
                    Ok(Socket::from_parts(
                        handle,
                        self.context,
                        self.family,
                        self.client_endpoint,
                    ))
                }
                Err(err) => Err(err),
            }
        }
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use crate::sys::windows::accept as win;

    impl<'s> Operation for Accept<'s> {
        type Output = io::Result<Socket>;

        fn await_ready(&mut self) -> bool {
            // The completion backend never has a synchronous accept result.
            false
        }

        fn suspend(&mut self) -> bool {
            win::suspend(
                &self.context,
                self.listener,
                self.family,
                &mut self.windows,
                &mut self.client_handle,
                &mut self.client_endpoint,
                &mut self.error,
            )
        }

        fn park(&mut self) {
            win::park(&self.context, &mut self.windows);
        }

        fn resume(&mut self) -> bool {
            win::resume(
                self.listener,
                &mut self.windows,
                &mut self.client_endpoint,
                &mut self.error,
            )
        }

        fn finish(self) -> io::Result<Socket> {
            match self.error.into_result(()) {
                Ok(()) => {
                    let handle = self
                        .client_handle
                        .expect("accept succeeded without a client handle");
                    Ok(Socket::from_parts(
                        handle,
                        self.context,
                        self.family,
                        self.client_endpoint,
                    ))
                }
                Err(err) => Err(err),
            }
        }
    }
}
