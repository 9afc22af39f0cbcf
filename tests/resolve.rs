use libuv_sys2 as uv;
use addrinfo_bridge::ffi::*;
use addrinfo_bridge::*;
use std::ffi::CStr;
use std::mem::size_of;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ptr;

fn ipv4_stream_hints() -> AddrInfoList<ForeignAddrInfo> {
    AddrInfoList::new(&AddrInfo::hints(libc::AF_INET, libc::SOCK_STREAM, 0)).unwrap()
}

#[test]
fn localhost_resolves_to_an_ipv4_stream_address() {
    let r#loop = Loop::new().unwrap();
    let hints = ipv4_stream_hints();

    let list = resolve_address(
        &r#loop,
        Some("localhost"),
        Some("80"),
        Some(&hints),
        &PosixBridge,
    )
    .unwrap();

    let first = list.iter().next().unwrap();
    assert_eq!(first.fields().family, libc::AF_INET);
    assert_eq!(
        first.address().map(<[u8]>::len),
        Some(size_of::<ForeignSockAddrIn>())
    );
    for info in list.infos() {
        let addr = info.addr.unwrap();
        assert!(addr.is_ipv4());
        assert_eq!(addr.port(), 80);
    }
}

#[test]
fn numeric_hosts_resolve_without_the_network() {
    let r#loop = Loop::new().unwrap();
    let mut hints = AddrInfo::hints(libc::AF_INET, libc::SOCK_DGRAM, 0);
    hints.flags = AddrInfoFlags::NUMERICHOST | AddrInfoFlags::NUMERICSERV;
    let hints = AddrInfoList::new(&hints).unwrap();

    let list = resolve_address(
        &r#loop,
        Some("192.0.2.10"),
        Some("5353"),
        Some(&hints),
        &PosixBridge,
    )
    .unwrap();

    let infos = list.infos();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].socktype, libc::SOCK_DGRAM);
    assert_eq!(
        infos[0].addr,
        Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)), 5353))
    );
}

#[test]
fn resolver_failures_keep_their_status() {
    let r#loop = Loop::new().unwrap();
    let mut hints = AddrInfo::hints(libc::AF_UNSPEC, 0, 0);
    hints.flags = AddrInfoFlags::NUMERICHOST;
    let hints = AddrInfoList::new(&hints).unwrap();

    let err = resolve_address(&r#loop, Some("not an address"), None, Some(&hints), &PosixBridge)
        .unwrap_err();

    assert!(err.is_status());
    assert_eq!(err.code(), uv::uv_errno_t_UV_EAI_NONAME as i32);
}

#[test]
fn numeric_name_lookup() {
    let r#loop = Loop::new().unwrap();
    let addr: SocketAddr = "127.0.0.1:80".parse().unwrap();

    let (host, service) = lookup_names(
        &r#loop,
        &addr,
        NameInfoFlags::NUMERICHOST | NameInfoFlags::NUMERICSERV,
    )
    .unwrap();

    assert_eq!(host, "127.0.0.1");
    assert_eq!(service, "80");
}

#[test]
fn c_abi_round_trip() {
    let hints = ipv4_stream_hints();
    let mut res = ForeignAddrInfo::default();

    let status = unsafe {
        addrinfo_bridge_getaddrinfo(
            b"127.0.0.1\0".as_ptr() as _,
            b"8080\0".as_ptr() as _,
            hints.as_ptr(),
            &mut res,
        )
    };
    assert_eq!(status, 0);
    assert_eq!(res.ai_family, libc::AF_INET);
    assert_eq!(res.ai_addrlen as usize, size_of::<ForeignSockAddrIn>());
    assert!(!res.ai_addr.is_null());

    let (mut host, mut serv) = ([0 as libc::c_char; 64], [0 as libc::c_char; 16]);
    let status = unsafe {
        addrinfo_bridge_getnameinfo(
            res.ai_addr,
            res.ai_addrlen,
            host.as_mut_ptr(),
            host.len() as u32,
            serv.as_mut_ptr(),
            serv.len() as u32,
            libc::NI_NUMERICHOST | libc::NI_NUMERICSERV,
        )
    };
    assert_eq!(status, 0);
    assert_eq!(unsafe { CStr::from_ptr(host.as_ptr()) }.to_bytes(), b"127.0.0.1");
    assert_eq!(unsafe { CStr::from_ptr(serv.as_ptr()) }.to_bytes(), b"8080");

    let family = res.ai_family;
    unsafe { addrinfo_bridge_freeaddrinfo(&mut res) };
    assert_eq!(res.ai_family, family);
    unsafe { addrinfo_bridge_freeaddrinfo(ptr::null_mut()) };
}

#[test]
fn c_abi_failure_leaves_an_empty_record() {
    let mut hints = AddrInfo::hints(libc::AF_UNSPEC, 0, 0);
    hints.flags = AddrInfoFlags::NUMERICHOST;
    let hints = AddrInfoList::<ForeignAddrInfo>::new(&hints).unwrap();
    let mut res = ForeignAddrInfo::default();
    res.ai_family = 99;

    let status = unsafe {
        addrinfo_bridge_getaddrinfo(
            b"not an address\0".as_ptr() as _,
            ptr::null(),
            hints.as_ptr(),
            &mut res,
        )
    };

    assert_eq!(status, uv::uv_errno_t_UV_EAI_NONAME as i32);
    assert_eq!(res.ai_family, 0);
    assert!(res.ai_addr.is_null());
    assert!(res.ai_next.is_null());
    let message = unsafe { CStr::from_ptr(addrinfo_bridge_strerror(status)) };
    assert!(!message.to_bytes().is_empty());
}

#[test]
fn c_abi_name_buffers_that_are_too_small_overflow() {
    let addr = foreign_sockaddr(&"127.0.0.1:80".parse().unwrap()).unwrap();
    let mut host = [0 as libc::c_char; 4];

    let status = unsafe {
        addrinfo_bridge_getnameinfo(
            addr.as_ptr() as *const ForeignSockAddr,
            addr.len() as u32,
            host.as_mut_ptr(),
            host.len() as u32,
            ptr::null_mut(),
            0,
            libc::NI_NUMERICHOST,
        )
    };

    assert_eq!(status, uv::uv_errno_t_UV_EAI_OVERFLOW as i32);
}

#[test]
fn c_abi_short_addresses_get_a_bridge_status() {
    let addr = foreign_sockaddr(&"[::1]:80".parse().unwrap()).unwrap();
    let mut host = [0 as libc::c_char; 64];

    let status = unsafe {
        addrinfo_bridge_getnameinfo(
            addr.as_ptr() as *const ForeignSockAddr,
            8,
            host.as_mut_ptr(),
            host.len() as u32,
            ptr::null_mut(),
            0,
            libc::NI_NUMERICHOST,
        )
    };

    assert_eq!(status, BRIDGE_EADDRLEN);
    assert_ne!(status, uv::uv_errno_t_UV_EINVAL as i32);
    let message = unsafe { CStr::from_ptr(addrinfo_bridge_strerror(status)) };
    assert_eq!(message.to_str().unwrap(), "socket address too short for its family");

    let resolver_status = unsafe {
        let mut res = ForeignAddrInfo::default();
        addrinfo_bridge_getaddrinfo(ptr::null(), ptr::null(), ptr::null(), &mut res)
    };
    assert_eq!(resolver_status, uv::uv_errno_t_UV_EINVAL as i32);
    assert_ne!(resolver_status, status);
}
