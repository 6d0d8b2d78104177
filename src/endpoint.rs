//! Address + family + length, modeled as a tagged variant rather than a raw
//! `sockaddr_storage`-sized buffer plus a separate length field, which
//! invites misalignment and stale-length bugs. The length here is a
//! derived property of which variant is populated, not separately tracked
//! state that can drift from it.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

/// An address family plus address, or the unset state before a connect
/// target is known / before accept has filled in a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    #[default]
    Unset,
    V4(SocketAddrV4),
    V6(SocketAddrV6),
}

impl Endpoint {
    /// Length in bytes of the concrete `sockaddr_in`/`sockaddr_in6` this
    /// endpoint would serialize to; 0 when unset.
    pub fn len(&self) -> usize {
        match self {
            Endpoint::Unset => 0,
            Endpoint::V4(_) => std::mem::size_of::<libc_compat::sockaddr_in>(),
            Endpoint::V6(_) => std::mem::size_of::<libc_compat::sockaddr_in6>(),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Endpoint::Unset)
    }

    pub fn to_socket_addr(self) -> Option<SocketAddr> {
        match self {
            Endpoint::Unset => None,
            Endpoint::V4(a) => Some(SocketAddr::V4(a)),
            Endpoint::V6(a) => Some(SocketAddr::V6(a)),
        }
    }

    /// The wildcard endpoint for this family's auto-bind, at port 0.
    ///
    /// Used by the completion-backend connect, which must bind a socket
    /// before `ConnectEx` can be issued. Picks the family-appropriate
    /// wildcard so an IPv6 destination isn't bound to an IPv4 address.
    pub fn wildcard_for(family: Family) -> Endpoint {
        match family {
            Family::V4 => Endpoint::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            Family::V6 => Endpoint::V6(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0)),
        }
    }

    pub fn family(&self) -> Option<Family> {
        match self {
            Endpoint::Unset => None,
            Endpoint::V4(_) => Some(Family::V4),
            Endpoint::V6(_) => Some(Family::V6),
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(a) => Endpoint::V4(a),
            SocketAddr::V6(a) => Endpoint::V6(a),
        }
    }
}

/// Address family a [`crate::socket::Socket`] was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub fn of(addr: &SocketAddr) -> Family {
        match addr {
            SocketAddr::V4(_) => Family::V4,
            SocketAddr::V6(_) => Family::V6,
        }
    }

    pub fn to_domain(self) -> socket2::Domain {
        match self {
            Family::V4 => socket2::Domain::IPV4,
            Family::V6 => socket2::Domain::IPV6,
        }
    }
}

/// Just enough of the platform `sockaddr_in`/`sockaddr_in6` layout to compute
/// sizes without pulling `libc` into non-unix builds; on unix this simply
/// re-exports the real types, matching the on-the-wire length the kernel
/// expects from `accept`/`getsockname`.
#[cfg(unix)]
mod libc_compat {
    pub(crate) use libc::{sockaddr_in, sockaddr_in6};
}

#[cfg(windows)]
mod libc_compat {
    #[repr(C)]
    pub(crate) struct sockaddr_in {
        _data: [u8; 16],
    }
    #[repr(C)]
    pub(crate) struct sockaddr_in6 {
        _data: [u8; 28],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_has_zero_length() {
        assert_eq!(Endpoint::Unset.len(), 0);
        assert!(Endpoint::Unset.is_unset());
    }

    #[test]
    fn v4_length_matches_sockaddr_in() {
        let ep = Endpoint::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080));
        assert_eq!(ep.len(), std::mem::size_of::<libc_compat::sockaddr_in>());
        assert_eq!(ep.family(), Some(Family::V4));
    }

    #[test]
    fn v6_length_matches_sockaddr_in6() {
        let ep = Endpoint::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, 8080, 0, 0));
        assert_eq!(ep.len(), std::mem::size_of::<libc_compat::sockaddr_in6>());
        assert_eq!(ep.family(), Some(Family::V6));
    }

    #[test]
    fn wildcard_is_family_appropriate() {
        assert_eq!(
            Endpoint::wildcard_for(Family::V4).family(),
            Some(Family::V4)
        );
        assert_eq!(
            Endpoint::wildcard_for(Family::V6).family(),
            Some(Family::V6)
        );
    }
}
