//! `recv`'s completion-backend half: a single `WSARecv`, reaped with
//! `GetOverlappedResult`.

use std::os::windows::io::AsRawSocket;
use std::rc::Rc;

use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::Networking::WinSock::{WSARecv, WSAGetLastError, SOCKET, WSABUF};
use windows_sys::Win32::System::IO::GetOverlappedResult;

use crate::context::Context;
use crate::error::ErrorSlot;
use crate::ops::cursor::Cursor;
use crate::socket::Socket;
use crate::sys::windows::overlapped::Overlapped;

const ERROR_IO_PENDING: i32 = 997;

pub(crate) struct State {
    overlapped: Overlapped,
    bytes: u32,
    flags: u32,
}

impl State {
    pub(crate) fn new() -> State {
        State {
            overlapped: Overlapped::new(),
            bytes: 0,
            flags: 0,
        }
    }
}

pub(crate) fn suspend(socket: &Socket, cursor: &mut Cursor, state: &mut State, error: &mut ErrorSlot) -> bool {
    let raw_socket = socket.handle().as_raw_socket() as SOCKET;
    let mut wsabuf = WSABUF {
        len: cursor.remaining_mut().len() as u32,
        buf: cursor.remaining_mut().as_mut_ptr(),
    };
    let rc = unsafe {
        WSARecv(
            raw_socket,
            &mut wsabuf,
            1,
            &mut state.bytes,
            &mut state.flags,
            state.overlapped.get(),
            None,
        )
    };
    if rc == 0 {
        cursor.advance(state.bytes as usize);
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

pub(crate) fn resume(cursor: &mut Cursor, state: &mut State, socket_handle: &Socket, error: &mut ErrorSlot) -> bool {
    let mut bytes: u32 = 0;
    let ok = unsafe {
        GetOverlappedResult(
            socket_handle.handle().as_raw_socket() as isize,
            state.overlapped.get(),
            &mut bytes,
            0,
        )
    };
    if ok == 0 {
        error.set_system(unsafe { GetLastError() } as i32);
    } else {
        cursor.advance(bytes as usize);
    }
    true
}
