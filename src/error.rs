//! The error taxonomy operations use to report outcomes on their error slot.
//!
//! Operations never throw: a failed phase records a code here and the
//! generic [`crate::op::drive`] scheduler surfaces it as an [`io::Error`]
//! once the operation is done. The taxonomy mirrors the one the socket core
//! was distilled from: transient conditions never escape the Operation,
//! `ECONNRESET` is normalized per-operation, and everything else is passed
//! through verbatim.

use std::fmt;
use std::io;

/// Zero means success; this is the `errno`/`WSAGetLastError`-shaped code an
/// [`crate::op::Operation`] stashes in its error slot.
pub type RawCode = i32;

/// Taxonomy of outcomes an [`crate::op::Operation`] phase can record.
///
/// Only [`OperationError::System`] and [`OperationError::Initialization`]
/// reach the caller; [`OperationError::WouldBlock`] drives the
/// await-suspend transition internally and is never stored in an error
/// slot, and peer-reset normalization happens before an error is ever
/// constructed (see the per-operation modules under [`crate::ops`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Any kernel error other than the cases called out below, carried
    /// verbatim from `errno` / `WSAGetLastError` / `SO_ERROR`.
    System(RawCode),
    /// The completion backend's lazily-initialized extension function
    /// pointer (`ConnectEx`) failed to resolve. Sticky and process-global;
    /// every subsequent connect on that backend observes the same code.
    Initialization(RawCode),
}

impl OperationError {
    pub fn code(self) -> RawCode {
        match self {
            OperationError::System(c) | OperationError::Initialization(c) => c,
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::System(c) => write!(f, "system error {c}"),
            OperationError::Initialization(c) => {
                write!(f, "completion backend initialization failed: {c}")
            }
        }
    }
}

impl std::error::Error for OperationError {}

impl From<OperationError> for io::Error {
    fn from(err: OperationError) -> io::Error {
        io::Error::from_raw_os_error(err.code())
    }
}

/// `listen` is the one core call that reports failure the conventional way
/// (spec: "a typed error carrying errno and a fixed string"), rather than
/// through an Operation's error slot.
#[derive(Debug)]
pub struct ListenError {
    code: RawCode,
}

impl ListenError {
    pub(crate) fn new(code: RawCode) -> Self {
        ListenError { code }
    }

    pub fn code(&self) -> RawCode {
        self.code
    }
}

impl fmt::Display for ListenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listen on socket: {}", io::Error::from_raw_os_error(self.code))
    }
}

impl std::error::Error for ListenError {}

impl From<ListenError> for io::Error {
    fn from(err: ListenError) -> io::Error {
        io::Error::from_raw_os_error(err.code)
    }
}

/// An error-slot value: `None` is success, matching the "zero means
/// success" convention operations report outcomes with. Last-write-wins:
/// once set, a slot is never cleared or overwritten by a later phase.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ErrorSlot(Option<OperationError>);

impl ErrorSlot {
    pub(crate) fn new() -> Self {
        ErrorSlot(None)
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Records `err` only if the slot is still empty.
    pub(crate) fn set_system(&mut self, code: RawCode) {
        if self.0.is_none() {
            self.0 = Some(OperationError::System(code));
        }
    }

    pub(crate) fn set(&mut self, err: OperationError) {
        if self.0.is_none() {
            self.0 = Some(err);
        }
    }

    pub(crate) fn set_last_os_error(&mut self) {
        self.set_system(last_os_error_code());
    }

    pub(crate) fn into_result<T>(self, value: T) -> io::Result<T> {
        match self.0 {
            Some(err) => Err(err.into()),
            None => Ok(value),
        }
    }
}

#[cfg(unix)]
pub(crate) fn last_os_error_code() -> RawCode {
    unsafe { *libc::__errno_location() }
}

#[cfg(windows)]
pub(crate) fn last_os_error_code() -> RawCode {
    unsafe { windows_sys::Win32::Foundation::GetLastError() as RawCode }
}

#[cfg(unix)]
pub(crate) fn would_block(code: RawCode) -> bool {
    code == libc::EAGAIN || code == libc::EWOULDBLOCK || code == libc::EINTR
}

#[cfg(unix)]
pub(crate) fn is_conn_reset(code: RawCode) -> bool {
    code == libc::ECONNRESET
}
