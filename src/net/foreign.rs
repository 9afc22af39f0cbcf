//! Structures in the foreign layout.
//!
//! The foreign layout is fixed across platforms: the address family is a 16-bit integer at
//! offset 0 (there is never an `sa_len` byte), `socklen_t` is a 32-bit unsigned integer, and
//! address family numbers are the host's own `AF_*` values.
use std::net::{Ipv4Addr, Ipv6Addr};
use std::os::raw::{c_char, c_int};

/// Foreign `socklen_t`.
pub type ForeignSockLen = u32;

/// Foreign `sa_family_t`.
pub type ForeignSaFamily = u16;

/// Foreign `struct in_addr`. `s_addr` is stored in network byte order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForeignInAddr {
    pub s_addr: u32,
}

impl ForeignInAddr {
    /// Converts to the native `struct in_addr`.
    pub fn to_native(&self) -> libc::in_addr {
        libc::in_addr {
            s_addr: self.s_addr as _,
        }
    }

    /// Converts from the native `struct in_addr`.
    pub fn from_native(addr: &libc::in_addr) -> ForeignInAddr {
        ForeignInAddr {
            s_addr: addr.s_addr as _,
        }
    }
}

impl From<Ipv4Addr> for ForeignInAddr {
    fn from(ip: Ipv4Addr) -> ForeignInAddr {
        ForeignInAddr {
            s_addr: u32::from_ne_bytes(ip.octets()),
        }
    }
}

impl From<ForeignInAddr> for Ipv4Addr {
    fn from(addr: ForeignInAddr) -> Ipv4Addr {
        Ipv4Addr::from(addr.s_addr.to_ne_bytes())
    }
}

/// Foreign `struct in6_addr`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForeignIn6Addr {
    pub s6_addr: [u8; 16],
}

impl ForeignIn6Addr {
    /// Converts to the native `struct in6_addr`.
    pub fn to_native(&self) -> libc::in6_addr {
        libc::in6_addr {
            s6_addr: self.s6_addr,
        }
    }

    /// Converts from the native `struct in6_addr`.
    pub fn from_native(addr: &libc::in6_addr) -> ForeignIn6Addr {
        ForeignIn6Addr {
            s6_addr: addr.s6_addr,
        }
    }
}

impl From<Ipv6Addr> for ForeignIn6Addr {
    fn from(ip: Ipv6Addr) -> ForeignIn6Addr {
        ForeignIn6Addr {
            s6_addr: ip.octets(),
        }
    }
}

impl From<ForeignIn6Addr> for Ipv6Addr {
    fn from(addr: ForeignIn6Addr) -> Ipv6Addr {
        Ipv6Addr::from(addr.s6_addr)
    }
}

/// Foreign `struct sockaddr`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ForeignSockAddr {
    pub sa_family: ForeignSaFamily,
    pub sa_data: [c_char; 14],
}

/// Foreign `struct sockaddr_in`. Port is in network byte order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForeignSockAddrIn {
    pub sin_family: ForeignSaFamily,
    pub sin_port: u16,
    pub sin_addr: ForeignInAddr,
    pub sin_zero: [u8; 8],
}

/// Foreign `struct sockaddr_in6`. Port is in network byte order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForeignSockAddrIn6 {
    pub sin6_family: ForeignSaFamily,
    pub sin6_port: u16,
    pub sin6_flowinfo: u32,
    pub sin6_addr: ForeignIn6Addr,
    pub sin6_scope_id: u32,
}

/// Foreign `struct addrinfo`.
///
/// `ai_addr`, when non-null, points at exactly `ai_addrlen` bytes. Records produced by this crate
/// must be released with [`release`](crate::release) (records 2..N) and are never freed by the
/// caller's own allocator.
#[repr(C)]
#[derive(Debug)]
pub struct ForeignAddrInfo {
    pub ai_flags: c_int,
    pub ai_family: c_int,
    pub ai_socktype: c_int,
    pub ai_protocol: c_int,
    pub ai_addrlen: ForeignSockLen,
    pub ai_addr: *mut ForeignSockAddr,
    pub ai_canonname: *mut c_char,
    pub ai_next: *mut ForeignAddrInfo,
}

impl Default for ForeignAddrInfo {
    fn default() -> ForeignAddrInfo {
        ForeignAddrInfo {
            ai_flags: 0,
            ai_family: 0,
            ai_socktype: 0,
            ai_protocol: 0,
            ai_addrlen: 0,
            ai_addr: std::ptr::null_mut(),
            ai_canonname: std::ptr::null_mut(),
            ai_next: std::ptr::null_mut(),
        }
    }
}
