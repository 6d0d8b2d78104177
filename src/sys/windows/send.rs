//! `send`'s completion-backend half: `WSASend` calls looped synchronously
//! until the buffer drains, blocks, or errors, with at most one posted
//! overlapped outstanding at a time.

use std::os::windows::io::AsRawSocket;
use std::rc::Rc;

use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::Networking::WinSock::{WSASend, WSAGetLastError, SOCKET, WSABUF};
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
}

impl State {
    pub(crate) fn new() -> State {
        State {
            overlapped: Overlapped::new(),
            bytes: 0,
        }
    }
}

pub(crate) fn suspend(socket: &Socket, cursor: &mut Cursor, state: &mut State, error: &mut ErrorSlot) -> bool {
    let raw_socket = socket.handle().as_raw_socket() as SOCKET;
    while !cursor.is_drained() {
        let mut wsabuf = WSABUF {
            len: cursor.remaining().len() as u32,
            buf: cursor.remaining_mut().as_mut_ptr(),
        };
        let rc = unsafe {
            WSASend(
                raw_socket,
                &mut wsabuf,
                1,
                &mut state.bytes,
                0,
                state.overlapped.get(),
                None,
            )
        };
        if rc != 0 {
            let code = unsafe { WSAGetLastError() };
            if code != ERROR_IO_PENDING {
                error.set_system(code);
                return false;
            }
            return true;
        }
        cursor.advance(state.bytes as usize);
        if state.bytes == 0 {
            break;
        }
    }
    false
}

pub(crate) fn park(context: &Rc<Context>, state: &mut State) {
    context.park(state.overlapped.get());
}

pub(crate) fn resume(socket: &Socket, cursor: &mut Cursor, state: &mut State, error: &mut ErrorSlot) -> bool {
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
        error.set_system(unsafe { GetLastError() } as i32);
        return true;
    }
    cursor.advance(bytes as usize);
    if bytes > 0 && !cursor.is_drained() {
        return false;
    }
    true
}
