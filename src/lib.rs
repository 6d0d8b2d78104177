//! A cross-platform, single-threaded asynchronous TCP socket core.
//!
//! [`Socket`] owns a non-blocking descriptor and a reference to a
//! [`Context`], the reactor/proactor it is registered with. Every I/O
//! request is an [`Operation`]: construct one of [`ops::Accept`],
//! [`ops::Connect`], [`ops::Recv`], [`ops::Send`], or [`ops::SendSome`]
//! against a socket and drive it to completion with [`op::drive`].
//!
//! Two backends implement [`Context`] and the per-operation phases, chosen
//! at build time: a readiness-based one on unix (`epoll`), a
//! completion-based one on Windows (I/O completion ports). Callers never
//! branch on platform themselves; the same `Socket`/`Operation` surface
//! works on both.
//!
//! A `Context` is single-threaded: it is not `Send`/`Sync`, and every
//! `Socket` built against it must stay on the thread that drives it.
//! Separate `Context`s may run on separate threads with no coordination
//! between them.
//!
//! ```no_run
//! use std::rc::Rc;
//! use tcpio::{op::drive, ops::Recv, Context, Endpoint, Family, Socket};
//!
//! # fn main() -> std::io::Result<()> {
//! let context = Context::new()?;
//! let socket = Socket::new(Rc::clone(&context), Family::V4)?;
//! let mut buf = [0u8; 1024];
//! let _ = drive(Recv::new(&socket, &mut buf));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(any(unix, windows)), allow(unused))]

pub mod context;
pub mod endpoint;
pub mod error;
pub mod handle;
pub mod op;
pub mod ops;
pub mod socket;

mod sys;

pub use context::Context;
pub use endpoint::{Endpoint, Family};
pub use error::{ListenError, OperationError};
pub use handle::Handle;
pub use op::Operation;
pub use socket::Socket;
