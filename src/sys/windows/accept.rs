//! `accept`'s completion-backend half: `AcceptEx` against a pre-created
//! client socket, reaped with `GetOverlappedResult`.

use std::mem::size_of;
use std::os::windows::io::{AsRawSocket, RawSocket};
use std::rc::Rc;

use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::Networking::WinSock::{
    AcceptEx, WSAGetLastError, AF_INET, AF_INET6, INVALID_SOCKET, IPPROTO_TCP, SOCKADDR_IN6,
    SOCKADDR_STORAGE, SOCKET, SOCK_STREAM, WSAECONNRESET, WSASocketW, WSA_FLAG_OVERLAPPED,
};
use windows_sys::Win32::System::IO::GetOverlappedResult;

use crate::context::Context;
use crate::endpoint::{Endpoint, Family};
use crate::error::ErrorSlot;
use crate::handle::Handle;
use crate::socket::Socket;
use crate::sys::windows::net::endpoint_from_sockaddr;
use crate::sys::windows::overlapped::Overlapped;

const ADDR_LEN: u32 = (size_of::<SOCKADDR_IN6>() + 16) as u32;

pub(crate) struct State {
    overlapped: Overlapped,
    buffer: [u8; 2 * (size_of::<SOCKADDR_IN6>() + 16)],
    bytes: u32,
}

impl State {
    pub(crate) fn new() -> State {
        State {
            overlapped: Overlapped::new(),
            buffer: [0; 2 * (size_of::<SOCKADDR_IN6>() + 16)],
            bytes: 0,
        }
    }
}

const ERROR_IO_PENDING: i32 = 997;

/// Extracts the peer address `AcceptEx` wrote into `state.buffer`. With
/// `dwLocalAddressLength == dwRemoteAddressLength == ADDR_LEN` and no leading
/// receive data, the remote address starts exactly `ADDR_LEN` bytes in, so no
/// `GetAcceptExSockaddrs` call is needed.
unsafe fn parse_remote_addr(state: &State) -> Endpoint {
    let remote_addr =
        state.buffer.as_ptr().add(ADDR_LEN as usize) as *const SOCKADDR_STORAGE;
    endpoint_from_sockaddr(remote_addr)
}

pub(crate) fn suspend(
    context: &Rc<Context>,
    listener: &Socket,
    family: Family,
    state: &mut State,
    client_handle: &mut Option<Handle>,
    client_endpoint: &mut Endpoint,
    error: &mut ErrorSlot,
) -> bool {
    if client_handle.is_none() {
        let af = match family {
            Family::V4 => AF_INET,
            Family::V6 => AF_INET6,
        };
        let raw = unsafe {
            WSASocketW(
                af as i32,
                SOCK_STREAM,
                IPPROTO_TCP as i32,
                std::ptr::null(),
                0,
                WSA_FLAG_OVERLAPPED,
            )
        };
        if raw == INVALID_SOCKET {
            error.set_system(unsafe { WSAGetLastError() });
            return false;
        }
        let handle = unsafe { Handle::from_raw(raw as RawSocket) };
        if let Err(err) = context.associate(handle.as_raw_socket()) {
            error.set_system(err.raw_os_error().unwrap_or(-1));
            return false;
        }
        *client_handle = Some(handle);
    }

    let listener_socket = listener.handle().as_raw_socket() as SOCKET;
    let client_socket = client_handle.as_ref().unwrap().as_raw_socket() as SOCKET;
    loop {
        let ok = unsafe {
            AcceptEx(
                listener_socket,
                client_socket,
                state.buffer.as_mut_ptr() as *mut core::ffi::c_void,
                0,
                ADDR_LEN,
                ADDR_LEN,
                &mut state.bytes,
                state.overlapped.get(),
            )
        };
        if ok != 0 {
            *client_endpoint = unsafe { parse_remote_addr(state) };
            return false;
        }
        let code = unsafe { WSAGetLastError() };
        if code == ERROR_IO_PENDING {
            return true;
        }
        if code != WSAECONNRESET {
            error.set_system(code);
            return false;
        }
        // Soft retry: a reset between the listen backlog and AcceptEx is
        // swallowed and the call reissued.
    }
}

pub(crate) fn park(context: &Rc<Context>, state: &mut State) {
    context.park(state.overlapped.get());
}

pub(crate) fn resume(
    listener: &Socket,
    state: &mut State,
    client_endpoint: &mut Endpoint,
    error: &mut ErrorSlot,
) -> bool {
    let mut bytes: u32 = 0;
    let ok = unsafe {
        GetOverlappedResult(
            listener.handle().as_raw_socket() as isize,
            state.overlapped.get(),
            &mut bytes,
            0,
        )
    };
    if ok == 0 {
        let code = unsafe { GetLastError() } as i32;
        if code != WSAECONNRESET {
            error.set_system(code);
            return true;
        }
        return false;
    }
    *client_endpoint = unsafe { parse_remote_addr(state) };
    true
}
