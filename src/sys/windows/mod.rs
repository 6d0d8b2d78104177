//! The completion-based backend: one IOCP per [`crate::context::Context`],
//! `OVERLAPPED`-carrying operations posted with `AcceptEx`/`ConnectEx`/
//! `WSARecv`/`WSASend` and reaped with `GetOverlappedResult`.

pub(crate) mod context;
pub(crate) mod net;
pub(crate) mod overlapped;

pub(crate) mod accept;
pub(crate) mod connect;
pub(crate) mod recv;
pub(crate) mod send;
pub(crate) mod send_some;
