//! The event multiplexer the core binds to.
//!
//! The reactor/proactor is treated as a collaborator behind a narrow
//! interface: `queue_recv`, `queue_send`, and (on the completion backend) a
//! completion-token accessor. This module re-exports the one concrete
//! `Context` this crate ships — an epoll-backed readiness reactor on unix,
//! an IOCP-backed completion reactor on Windows — chosen at build time via
//! `cfg` rather than branching inline through every operation body. A host
//! application is free to swap in a richer reactor behind the same surface;
//! this crate does not require it.
//!
//! Scheduling model: single-threaded cooperative per `Context`. A `Context`
//! is not `Send`/`Sync`; sockets bound to it stay on the thread that drives
//! it. Multiple `Context`s may exist in a process and run on separate
//! threads in parallel.

#[cfg(unix)]
pub use crate::sys::unix::context::Context;
#[cfg(windows)]
pub use crate::sys::windows::context::Context;
