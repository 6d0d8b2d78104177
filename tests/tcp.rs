//! End-to-end loopback tests exercising every operation against a real
//! kernel socket pair: orderly close and peer reset both observed as
//! `Ok(0)` by `recv`, a partial `send` draining fully even against a tiny
//! send buffer, `send_some`'s single-shot behavior, and `connect` failing
//! with `ECONNREFUSED` against a closed port.

#![cfg(unix)]

use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::io::AsRawFd;
use std::rc::Rc;
use std::time::Duration;

use tcpio::op::drive;
use tcpio::ops::{Accept, Connect, Recv, Send, SendSome};
use tcpio::{Context, Endpoint, Family, Socket};

/// Binds `socket` to loopback on an OS-chosen port and puts it into the
/// listening state, returning the port actually assigned.
///
/// `bind` is deliberately outside this crate's own surface, so tests reach
/// past `Socket` to the raw descriptor to set it up, the way an embedding
/// application is expected to.
fn bind_and_listen(socket: &Socket, backlog: u32) -> std::io::Result<u16> {
    let fd = socket.handle().as_raw_fd();
    let addr = libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: 0,
        sin_addr: libc::in_addr {
            s_addr: u32::from_ne_bytes(Ipv4Addr::LOCALHOST.octets()),
        },
        sin_zero: [0; 8],
    };
    let rc = unsafe {
        libc::bind(
            fd,
            &addr as *const _ as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    socket.listen(backlog).map_err(std::io::Error::from)?;

    let mut got: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    let mut len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
    let rc = unsafe {
        libc::getsockname(fd, &mut got as *mut _ as *mut libc::sockaddr, &mut len)
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(u16::from_be(got.sin_port))
}

fn loopback(port: u16) -> Endpoint {
    Endpoint::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

fn connected_pair(context: &Rc<Context>) -> (Socket, Socket) {
    let listener = Socket::new(Rc::clone(context), Family::V4).unwrap();
    let port = bind_and_listen(&listener, 1).unwrap();

    let mut client = Socket::new(Rc::clone(context), Family::V4).unwrap();
    let connect = drive(Connect::new(&mut client, loopback(port)));
    let server = drive(Accept::new(&listener)).unwrap();
    connect.unwrap();
    (client, server)
}

#[test]
fn loopback_echo() {
    let _ = env_logger::try_init();
    let context = Context::new().unwrap();
    let (client, server) = connected_pair(&context);

    let mut payload = *b"hello over loopback";
    let sent = drive(Send::new(&client, &mut payload)).unwrap();
    assert_eq!(sent, payload.len());

    let mut buf = [0u8; 64];
    let received = drive(Recv::new(&server, &mut buf)).unwrap();
    assert_eq!(&buf[..received], &payload[..]);
}

#[test]
fn orderly_close_observed_by_recv() {
    let _ = env_logger::try_init();
    let context = Context::new().unwrap();
    let (client, server) = connected_pair(&context);
    drop(client);

    let mut buf = [0u8; 16];
    let n = drive(Recv::new(&server, &mut buf)).unwrap();
    assert_eq!(n, 0);
}

#[test]
fn peer_reset_observed_by_recv() {
    let _ = env_logger::try_init();
    let context = Context::new().unwrap();
    let (client, server) = connected_pair(&context);

    // An abortive close (SO_LINGER{on=1, timeout=0}) sends RST instead of
    // FIN; the peer's `recv` must normalize that to `Ok(0)` exactly like an
    // orderly close.
    let data = libc::linger {
        l_onoff: 1,
        l_linger: 0,
    };
    let rc = unsafe {
        libc::setsockopt(
            client.handle().as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_LINGER,
            &data as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::linger>() as libc::socklen_t,
        )
    };
    assert_eq!(rc, 0);
    drop(client);

    // Give the reset a moment to arrive before the server reads.
    std::thread::sleep(Duration::from_millis(50));

    let mut buf = [0u8; 16];
    let n = drive(Recv::new(&server, &mut buf)).unwrap();
    assert_eq!(n, 0);
}

#[test]
fn send_drains_fully_against_a_tiny_send_buffer() {
    let _ = env_logger::try_init();
    // The peer here is a plain blocking `std::net::TcpListener`, not another
    // `Socket` on this crate's own `Context`: a `Context` is single-threaded
    // and the point of this test is `send`'s drain loop on the client side,
    // not a second concurrently-driven `Socket`.
    use std::io::Read;

    let listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    let to_send = 256 * 1024;

    let reader = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 8192];
        let mut total = 0usize;
        while total < to_send {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        total
    });

    let context = Context::new().unwrap();
    let mut client = Socket::new(context, Family::V4).unwrap();
    let tiny: libc::c_int = 1024;
    unsafe {
        libc::setsockopt(
            client.handle().as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &tiny as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
    drive(Connect::new(&mut client, loopback(port))).unwrap();

    let mut payload = vec![0x5au8; to_send];
    let sent = drive(Send::new(&client, &mut payload)).unwrap();
    assert_eq!(sent, to_send);

    let received = reader.join().unwrap();
    assert_eq!(received, to_send);
}

#[test]
fn send_some_performs_at_most_one_partial_write() {
    let _ = env_logger::try_init();
    let context = Context::new().unwrap();
    let (client, server) = connected_pair(&context);

    let tiny: libc::c_int = 1024;
    unsafe {
        libc::setsockopt(
            client.handle().as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &tiny as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }

    let mut payload = vec![0x42u8; 1024 * 1024];
    let n = drive(SendSome::new(&client, &mut payload)).unwrap();
    assert!(n > 0, "send_some must make progress when writable");
    assert!(
        n < payload.len(),
        "send_some must not loop to drain the whole buffer like send does"
    );

    // Drain the rest so the thread doesn't linger past the test.
    let mut buf = [0u8; 8192];
    let _ = drive(Recv::new(&server, &mut buf));
}

#[test]
fn connect_to_closed_port_is_refused() {
    let _ = env_logger::try_init();
    let context = Context::new().unwrap();

    // Reserve a loopback port and immediately close it so nothing is
    // listening there.
    let probe = Socket::new(Rc::clone(&context), Family::V4).unwrap();
    let port = bind_and_listen(&probe, 1).unwrap();
    drop(probe);

    let mut client = Socket::new(Rc::clone(&context), Family::V4).unwrap();
    let result = drive(Connect::new(&mut client, loopback(port)));
    let err = result.expect_err("connect to a closed port must fail");
    assert_eq!(err.raw_os_error(), Some(libc::ECONNREFUSED));
}
