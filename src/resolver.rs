//! Lookups for callers that speak the foreign layout.
//!
//! Each operation converts its inputs to the native layout, calls a [`Resolver`], and converts
//! the answer back. Every native structure created along the way is released before the
//! operation returns; only foreign-layout results reach the caller. Nothing here holds state
//! between calls.
use crate::{convert, AddrInfoList, ForeignAddrInfo, Loop, NameInfoFlags};
use crate::{PosixBridge, SockAddrBridge, SockAddrBuf};
use log::{debug, trace};
use std::ffi::{CStr, CString};
use std::net::SocketAddr;
use std::ptr::NonNull;

/// Buffer size for host names returned by lookup_names() (NI_MAXHOST).
pub const MAX_HOST_LEN: usize = 1025;

/// Buffer size for service names returned by lookup_names() (NI_MAXSERV).
pub const MAX_SERVICE_LEN: usize = 32;

/// The system lookup facilities the bridge calls into.
///
/// Statuses are reported as `Error::Status` and passed to callers unchanged. The bridge adds no
/// synchronization: whether an implementation may be used from several threads at once is
/// entirely its own contract.
pub trait Resolver {
    /// getaddrinfo(3). On success returns the head of a native list owned by the resolver, to be
    /// released with freeaddrinfo().
    fn getaddrinfo(
        &self,
        node: Option<&CStr>,
        service: Option<&CStr>,
        hints: Option<&libc::addrinfo>,
    ) -> crate::Result<NonNull<libc::addrinfo>>;

    /// Releases a list returned by getaddrinfo().
    ///
    /// # Safety
    ///
    /// `res` must come from this resolver's getaddrinfo() and must not have been released.
    unsafe fn freeaddrinfo(&self, res: NonNull<libc::addrinfo>);

    /// getnameinfo(3) on a native socket address. Host and service names are written
    /// nul-terminated into the supplied buffers; an empty buffer means the name is not wanted.
    fn getnameinfo(
        &self,
        addr: &SockAddrBuf,
        flags: NameInfoFlags,
        host: &mut [u8],
        service: &mut [u8],
    ) -> crate::Result<()>;
}

impl Resolver for Loop {
    fn getaddrinfo(
        &self,
        node: Option<&CStr>,
        service: Option<&CStr>,
        hints: Option<&libc::addrinfo>,
    ) -> crate::Result<NonNull<libc::addrinfo>> {
        self.getaddrinfo_sync(node, service, hints)
    }

    unsafe fn freeaddrinfo(&self, res: NonNull<libc::addrinfo>) {
        crate::requests::getaddrinfo::freeaddrinfo(res)
    }

    fn getnameinfo(
        &self,
        addr: &SockAddrBuf,
        flags: NameInfoFlags,
        host: &mut [u8],
        service: &mut [u8],
    ) -> crate::Result<()> {
        self.getnameinfo_sync(addr, flags, host, service)
    }
}

/// A native result list, released through its resolver when dropped.
struct NativeAddrInfo<'r, R: Resolver + ?Sized> {
    resolver: &'r R,
    head: NonNull<libc::addrinfo>,
}

impl<'r, R: Resolver + ?Sized> NativeAddrInfo<'r, R> {
    fn head(&self) -> &libc::addrinfo {
        unsafe { self.head.as_ref() }
    }
}

impl<'r, R: Resolver + ?Sized> Drop for NativeAddrInfo<'r, R> {
    fn drop(&mut self) {
        unsafe { self.resolver.freeaddrinfo(self.head) };
    }
}

/// Resolves `name` and `service` into a foreign-layout list.
///
/// `hints`, when given, is converted to the native layout for the duration of the call. A failed
/// lookup returns the resolver's status untouched and converts nothing.
pub fn resolve_address<R, B>(
    resolver: &R,
    name: Option<&str>,
    service: Option<&str>,
    hints: Option<&AddrInfoList<ForeignAddrInfo>>,
    bridge: &B,
) -> crate::Result<AddrInfoList<ForeignAddrInfo>>
where
    R: Resolver + ?Sized,
    B: SockAddrBridge + ?Sized,
{
    let name = name.map(CString::new).transpose()?;
    let service = service.map(CString::new).transpose()?;
    unsafe {
        resolve_address_raw(
            resolver,
            name.as_deref(),
            service.as_deref(),
            hints.map(AddrInfoList::head),
            bridge,
        )
    }
}

/// resolve_address() for hints that did not come from an [`AddrInfoList`].
///
/// # Safety
///
/// `hints` must satisfy the requirements of [`convert()`].
pub unsafe fn resolve_address_raw<R, B>(
    resolver: &R,
    name: Option<&CStr>,
    service: Option<&CStr>,
    hints: Option<&ForeignAddrInfo>,
    bridge: &B,
) -> crate::Result<AddrInfoList<ForeignAddrInfo>>
where
    R: Resolver + ?Sized,
    B: SockAddrBridge + ?Sized,
{
    trace!("getaddrinfo node={:?} service={:?}", name, service);
    let native_hints = match hints {
        Some(hints) => Some(convert(hints, bridge).map_err(|e| {
            debug!("could not convert getaddrinfo hints: {}", e);
            e
        })?),
        None => None,
    };

    let res = resolver
        .getaddrinfo(name, service, native_hints.as_ref().map(AddrInfoList::head))
        .map_err(|e| {
            debug!("getaddrinfo {:?}/{:?} failed: {}", name, service, e);
            e
        })?;
    let res = NativeAddrInfo { resolver, head: res };

    let list = convert(res.head(), bridge)?;
    trace!("getaddrinfo returned {} records", list.len());
    Ok(list)
}

/// Looks up the host and service names of the foreign socket address `addr`.
///
/// `addr` is exactly the address length the caller passed. Names are written nul-terminated
/// into `host` and `service`; their contents are only defined when Ok is returned.
pub fn resolve_names<R, B>(
    resolver: &R,
    addr: &[u8],
    flags: NameInfoFlags,
    host: &mut [u8],
    service: &mut [u8],
    bridge: &B,
) -> crate::Result<()>
where
    R: Resolver + ?Sized,
    B: SockAddrBridge + ?Sized,
{
    trace!("getnameinfo addrlen={} flags={:?}", addr.len(), flags);
    let mut native = SockAddrBuf::new(addr.len())?;
    bridge.to_native(addr, native.as_bytes_mut())?;
    resolver
        .getnameinfo(&native, flags, host, service)
        .map_err(|e| {
            debug!("getnameinfo failed: {}", e);
            e
        })
}

/// resolve_names() for a std socket address, returning (host, service).
pub fn lookup_names<R>(
    resolver: &R,
    addr: &SocketAddr,
    flags: NameInfoFlags,
) -> crate::Result<(String, String)>
where
    R: Resolver + ?Sized,
{
    let foreign = crate::foreign_sockaddr(addr)?;
    let mut host = vec![0u8; MAX_HOST_LEN];
    let mut service = vec![0u8; MAX_SERVICE_LEN];
    resolve_names(
        resolver,
        foreign.as_bytes(),
        flags,
        &mut host,
        &mut service,
        &PosixBridge,
    )?;
    Ok((crate::buf_to_string(&host), crate::buf_to_string(&service)))
}
