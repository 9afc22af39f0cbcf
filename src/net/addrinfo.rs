use crate::{AddrInfoFlags, AddrInfoRef, ForeignAddrInfo, FromInner, SockAddrBridge, SockAddrBuf};
use std::net::SocketAddr;
use std::os::raw::{c_char, c_int};

/// The scalar fields of an addrinfo record. They are copied verbatim between layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub flags: c_int,
    pub family: c_int,
    pub socktype: c_int,
    pub protocol: c_int,
    pub addrlen: u32,
}

/// Uniform access to an addrinfo record in either layout.
///
/// The two layouts are each other's `Peer`: converting a record always produces a record of the
/// peer layout, with the socket address translated by `bridge_addr()`.
pub trait AddrInfoLayout: Sized {
    type Peer: AddrInfoLayout<Peer = Self>;

    /// A record with every field zeroed and every pointer null.
    fn empty() -> Self;

    fn fields(&self) -> RecordFields;
    fn set_fields(&mut self, fields: RecordFields);

    fn addr(&self) -> *mut u8;
    fn set_addr(&mut self, addr: *mut u8);

    fn canonname(&self) -> *mut c_char;
    fn set_canonname(&mut self, name: *mut c_char);

    fn next(&self) -> *mut Self;
    fn set_next(&mut self, next: *mut Self);

    /// Writes `src`, a socket address in this layout, into `dst` in the peer layout.
    fn bridge_addr<B: SockAddrBridge + ?Sized>(
        bridge: &B,
        src: &[u8],
        dst: &mut [u8],
    ) -> crate::Result<()>;

    /// Builds a socket address in this layout.
    fn encode_addr(addr: &SocketAddr) -> crate::Result<SockAddrBuf>;

    /// Parses a socket address in this layout.
    fn decode_addr(bytes: &[u8]) -> Option<SocketAddr>;
}

macro_rules! addrinfo_layout {
    ($record:ty, $sockaddr:ty, $peer:ty, $bridge:ident, $encode:path, $decode:path) => {
        impl AddrInfoLayout for $record {
            type Peer = $peer;

            fn empty() -> Self {
                unsafe { std::mem::zeroed() }
            }

            fn fields(&self) -> RecordFields {
                RecordFields {
                    flags: self.ai_flags,
                    family: self.ai_family,
                    socktype: self.ai_socktype,
                    protocol: self.ai_protocol,
                    addrlen: self.ai_addrlen as _,
                }
            }

            fn set_fields(&mut self, fields: RecordFields) {
                self.ai_flags = fields.flags;
                self.ai_family = fields.family;
                self.ai_socktype = fields.socktype;
                self.ai_protocol = fields.protocol;
                self.ai_addrlen = fields.addrlen as _;
            }

            fn addr(&self) -> *mut u8 {
                self.ai_addr as _
            }

            fn set_addr(&mut self, addr: *mut u8) {
                self.ai_addr = addr as *mut $sockaddr;
            }

            fn canonname(&self) -> *mut c_char {
                self.ai_canonname
            }

            fn set_canonname(&mut self, name: *mut c_char) {
                self.ai_canonname = name;
            }

            fn next(&self) -> *mut Self {
                self.ai_next
            }

            fn set_next(&mut self, next: *mut Self) {
                self.ai_next = next;
            }

            fn bridge_addr<B: SockAddrBridge + ?Sized>(
                bridge: &B,
                src: &[u8],
                dst: &mut [u8],
            ) -> crate::Result<()> {
                bridge.$bridge(src, dst)
            }

            fn encode_addr(addr: &SocketAddr) -> crate::Result<SockAddrBuf> {
                $encode(addr)
            }

            fn decode_addr(bytes: &[u8]) -> Option<SocketAddr> {
                $decode(bytes)
            }
        }
    };
}

addrinfo_layout!(
    ForeignAddrInfo,
    crate::ForeignSockAddr,
    libc::addrinfo,
    to_native,
    crate::foreign_sockaddr,
    crate::socketaddr_from_foreign
);

addrinfo_layout!(
    libc::addrinfo,
    libc::sockaddr,
    ForeignAddrInfo,
    to_foreign,
    crate::native_sockaddr,
    crate::socketaddr_from_native
);

/// An owned, layout independent copy of one addrinfo record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddrInfo {
    /// Bitwise OR of AI_* flags
    pub flags: AddrInfoFlags,

    /// One of the AF_* constants
    pub family: i32,

    /// One of the SOCK_* constants
    pub socktype: i32,

    /// One of the IPPROTO_* constants
    pub protocol: i32,

    /// The canonical name of the host
    pub canonical_name: Option<String>,

    /// The socket address, if the record carries one of a family std::net understands
    pub addr: Option<SocketAddr>,
}

impl AddrInfo {
    /// Hints restricting a lookup to the given family, socket type and protocol.
    pub fn hints(family: i32, socktype: i32, protocol: i32) -> AddrInfo {
        AddrInfo {
            flags: AddrInfoFlags::empty(),
            family,
            socktype,
            protocol,
            canonical_name: None,
            addr: None,
        }
    }
}

impl<'a, R: AddrInfoLayout> FromInner<AddrInfoRef<'a, R>> for AddrInfo {
    fn from_inner(record: AddrInfoRef<'a, R>) -> AddrInfo {
        let fields = record.fields();
        AddrInfo {
            // AI_IDN and other flags without a name here are carried unchanged.
            flags: unsafe { AddrInfoFlags::from_bits_unchecked(fields.flags) },
            family: fields.family,
            socktype: fields.socktype,
            protocol: fields.protocol,
            canonical_name: record
                .canonical_name()
                .map(|name| name.to_string_lossy().into_owned()),
            addr: record.address().and_then(R::decode_addr),
        }
    }
}
