//! `connect`'s completion-backend half: a wildcard bind (required before
//! `ConnectEx` will accept a socket) followed by the lazily resolved
//! `ConnectEx` call itself.

use std::os::windows::io::AsRawSocket;
use std::rc::Rc;

use windows_sys::Win32::Networking::WinSock::{bind, WSAGetLastError, SOCKET};
use windows_sys::Win32::System::IO::GetOverlappedResult;

use crate::context::Context;
use crate::endpoint::Endpoint;
use crate::error::{ErrorSlot, OperationError};
use crate::socket::Socket;
use crate::sys::windows::context::connect_ex;
use crate::sys::windows::net::RawSockAddr;
use crate::sys::windows::overlapped::Overlapped;

const ERROR_IO_PENDING: i32 = 997;

pub(crate) struct State {
    overlapped: Overlapped,
}

impl State {
    /// Binds `socket` to the family-appropriate wildcard address.
    /// `ConnectEx` requires the socket be bound first.
    pub(crate) fn new(socket: &Socket, error: &mut ErrorSlot) -> State {
        let wildcard = Endpoint::wildcard_for(socket.family());
        let addr = wildcard
            .to_socket_addr()
            .expect("wildcard_for always produces a bindable address");
        let raw = RawSockAddr::from(&addr);
        let (ptr, len) = raw.as_ptr_len();
        let rc = unsafe { bind(socket.handle().as_raw_socket() as SOCKET, ptr, len) };
        if rc != 0 {
            error.set_system(unsafe { WSAGetLastError() });
        }
        State {
            overlapped: Overlapped::new(),
        }
    }
}

pub(crate) fn suspend(
    socket: &Socket,
    endpoint: &Endpoint,
    state: &mut State,
    error: &mut ErrorSlot,
) -> bool {
    if error.is_set() {
        return false;
    }
    let raw_socket = socket.handle().as_raw_socket() as SOCKET;
    let connect_ex = match connect_ex(raw_socket) {
        Ok(Some(f)) => f,
        Ok(None) => {
            error.set(OperationError::Initialization(-1));
            return false;
        }
        Err(code) => {
            error.set(OperationError::Initialization(code));
            return false;
        }
    };
    let addr = endpoint
        .to_socket_addr()
        .expect("connect requires a set destination endpoint");
    let raw = RawSockAddr::from(&addr);
    let (ptr, len) = raw.as_ptr_len();
    let ok = unsafe {
        connect_ex(
            raw_socket,
            ptr,
            len,
            std::ptr::null(),
            0,
            std::ptr::null_mut(),
            state.overlapped.get(),
        )
    };
    if ok != 0 {
        return false;
    }
    let code = unsafe { WSAGetLastError() };
    if code != ERROR_IO_PENDING {
        error.set_system(code);
        return false;
    }
    true
}

pub(crate) fn park(context: &Rc<Context>, state: &mut State) {
    context.park(state.overlapped.get());
}

pub(crate) fn resume(socket: &Socket, state: &mut State, error: &mut ErrorSlot) -> bool {
    let mut bytes: u32 = 0;
    let ok = unsafe {
        GetOverlappedResult(
            socket.handle().as_raw_socket() as isize,
            state.overlapped.get(),
            &mut bytes,
            0,
        )
    };
    if ok == 0 {
        error.set_system(unsafe { windows_sys::Win32::Foundation::GetLastError() } as i32);
    }
    true
}
