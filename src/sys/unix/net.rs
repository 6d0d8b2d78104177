//! `sockaddr` conversions.

use std::mem;
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};

use crate::endpoint::Endpoint;

/// Owned `sockaddr_in`/`sockaddr_in6` storage. Owns the bytes instead of
/// borrowing a caller-provided `std::net` address, since `Endpoint` isn't
/// laid out as a raw `sockaddr`.
pub(crate) enum RawSockAddr {
    V4(libc::sockaddr_in),
    V6(libc::sockaddr_in6),
}

impl RawSockAddr {
    pub(crate) fn from(addr: &SocketAddr) -> RawSockAddr {
        match addr {
            SocketAddr::V4(a) => RawSockAddr::V4(to_sockaddr_in(a)),
            SocketAddr::V6(a) => RawSockAddr::V6(to_sockaddr_in6(a)),
        }
    }

    pub(crate) fn as_ptr_len(&self) -> (*const libc::sockaddr, libc::socklen_t) {
        match self {
            RawSockAddr::V4(a) => (
                a as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            ),
            RawSockAddr::V6(a) => (
                a as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
            ),
        }
    }
}

pub(crate) fn to_sockaddr_in(addr: &SocketAddrV4) -> libc::sockaddr_in {
    libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: addr.port().to_be(),
        sin_addr: libc::in_addr {
            s_addr: u32::from_ne_bytes(addr.ip().octets()),
        },
        sin_zero: [0; 8],
    }
}

pub(crate) fn to_sockaddr_in6(addr: &SocketAddrV6) -> libc::sockaddr_in6 {
    libc::sockaddr_in6 {
        sin6_family: libc::AF_INET6 as libc::sa_family_t,
        sin6_port: addr.port().to_be(),
        sin6_flowinfo: addr.flowinfo(),
        sin6_addr: libc::in6_addr {
            s6_addr: addr.ip().octets(),
        },
        sin6_scope_id: addr.scope_id(),
    }
}

/// Reads `storage`, which must contain a live `sockaddr_in` or
/// `sockaddr_in6`, into an [`Endpoint`].
///
/// # Safety
/// `storage` must point to `len` initialized bytes forming a valid
/// `sockaddr_in` (`len >= size_of::<sockaddr_in>()`) or `sockaddr_in6`.
pub(crate) unsafe fn endpoint_from_sockaddr(
    storage: *const libc::sockaddr_storage,
) -> Endpoint {
    match (*storage).ss_family as libc::c_int {
        libc::AF_INET => {
            let raw = *(storage as *const libc::sockaddr_in);
            Endpoint::V4(SocketAddrV4::new(
                raw.sin_addr.s_addr.to_ne_bytes().into(),
                u16::from_be(raw.sin_port),
            ))
        }
        libc::AF_INET6 => {
            let raw = *(storage as *const libc::sockaddr_in6);
            Endpoint::V6(SocketAddrV6::new(
                raw.sin6_addr.s6_addr.into(),
                u16::from_be(raw.sin6_port),
                raw.sin6_flowinfo,
                raw.sin6_scope_id,
            ))
        }
        _ => Endpoint::Unset,
    }
}
