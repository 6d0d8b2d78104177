//! `sockaddr` conversions for the Windows backend, mirroring
//! `sys::unix::net`.

use std::mem::size_of;
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};

use windows_sys::Win32::Networking::WinSock::{SOCKADDR, SOCKADDR_IN, SOCKADDR_IN6, SOCKADDR_STORAGE};

use crate::endpoint::Endpoint;

pub(crate) enum RawSockAddr {
    V4(SOCKADDR_IN),
    V6(SOCKADDR_IN6),
}

impl RawSockAddr {
    pub(crate) fn from(addr: &SocketAddr) -> RawSockAddr {
        match addr {
            SocketAddr::V4(v4) => RawSockAddr::V4(to_sockaddr_in(v4)),
            SocketAddr::V6(v6) => RawSockAddr::V6(to_sockaddr_in6(v6)),
        }
    }

    pub(crate) fn as_ptr_len(&self) -> (*const SOCKADDR, i32) {
        match self {
            RawSockAddr::V4(addr) => (
                addr as *const SOCKADDR_IN as *const SOCKADDR,
                size_of::<SOCKADDR_IN>() as i32,
            ),
            RawSockAddr::V6(addr) => (
                addr as *const SOCKADDR_IN6 as *const SOCKADDR,
                size_of::<SOCKADDR_IN6>() as i32,
            ),
        }
    }
}

fn to_sockaddr_in(addr: &SocketAddrV4) -> SOCKADDR_IN {
    use windows_sys::Win32::Networking::WinSock::{AF_INET, IN_ADDR, IN_ADDR_0};
    let mut sa: SOCKADDR_IN = unsafe { std::mem::zeroed() };
    sa.sin_family = AF_INET as u16;
    sa.sin_port = addr.port().to_be();
    sa.sin_addr = IN_ADDR {
        S_un: IN_ADDR_0 {
            S_addr: u32::from_ne_bytes(addr.ip().octets()),
        },
    };
    sa
}

fn to_sockaddr_in6(addr: &SocketAddrV6) -> SOCKADDR_IN6 {
    use windows_sys::Win32::Networking::WinSock::{AF_INET6, IN6_ADDR, IN6_ADDR_0, SOCKADDR_IN6_0};
    let mut sa: SOCKADDR_IN6 = unsafe { std::mem::zeroed() };
    sa.sin6_family = AF_INET6 as u16;
    sa.sin6_port = addr.port().to_be();
    sa.sin6_flowinfo = addr.flowinfo();
    sa.sin6_addr = IN6_ADDR {
        u: IN6_ADDR_0 {
            Byte: addr.ip().octets(),
        },
    };
    sa.Anonymous = SOCKADDR_IN6_0 {
        sin6_scope_id: addr.scope_id(),
    };
    sa
}

/// Reads the address a completed `AcceptEx` wrote into its output buffer,
/// already parsed by `GetAcceptExSockaddrs` into a `sockaddr_storage`-shaped
/// slice.
pub(crate) unsafe fn endpoint_from_sockaddr(storage: *const SOCKADDR_STORAGE) -> Endpoint {
    use windows_sys::Win32::Networking::WinSock::{AF_INET, AF_INET6};
    match (*storage).ss_family as u32 {
        AF_INET => {
            let sa = &*(storage as *const SOCKADDR_IN);
            let port = u16::from_be(sa.sin_port);
            let ip = unsafe { sa.sin_addr.S_un.S_addr }.to_ne_bytes();
            Endpoint::V4(SocketAddrV4::new(ip.into(), port))
        }
        AF_INET6 => {
            let sa = &*(storage as *const SOCKADDR_IN6);
            let port = u16::from_be(sa.sin6_port);
            let octets = unsafe { sa.sin6_addr.u.Byte };
            let scope_id = unsafe { sa.Anonymous.sin6_scope_id };
            Endpoint::V6(SocketAddrV6::new(octets.into(), port, sa.sin6_flowinfo, scope_id))
        }
        _ => Endpoint::Unset,
    }
}
