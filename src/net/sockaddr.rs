use crate::{Error, ForeignSockAddrIn, ForeignSockAddrIn6};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::mem::{align_of, size_of};
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

/// Both layouts start with a two byte header holding the family (and `sa_len` on BSD).
const HEADER_LEN: usize = 2;

/// An owned socket address buffer.
///
/// The buffer is exactly `len()` bytes long and aligned like `sockaddr_storage`, so it can be
/// handed to the system as a `struct sockaddr *` of any family.
pub struct SockAddrBuf {
    ptr: NonNull<u8>,
    len: usize,
}

impl SockAddrBuf {
    fn layout(len: usize) -> crate::Result<Layout> {
        Layout::from_size_align(len.max(1), align_of::<libc::sockaddr_storage>())
            .map_err(|_| Error::OutOfMemory)
    }

    /// Allocates a zeroed buffer of `len` bytes.
    pub fn new(len: usize) -> crate::Result<SockAddrBuf> {
        let layout = SockAddrBuf::layout(len)?;
        let ptr = unsafe { alloc_zeroed(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => Ok(SockAddrBuf { ptr, len }),
            None => Err(Error::OutOfMemory),
        }
    }

    fn from_value<T>(value: &T) -> crate::Result<SockAddrBuf> {
        let mut buf = SockAddrBuf::new(size_of::<T>())?;
        unsafe { ptr::copy_nonoverlapping(value as *const T as *const u8, buf.ptr.as_ptr(), buf.len) };
        Ok(buf)
    }

    /// Reclaims a buffer previously leaked with into_raw().
    ///
    /// # Safety
    ///
    /// `ptr` must come from into_raw() on a buffer of exactly `len` bytes and must not be used
    /// again afterwards.
    pub(crate) unsafe fn from_raw(ptr: *mut u8, len: usize) -> SockAddrBuf {
        SockAddrBuf {
            ptr: NonNull::new_unchecked(ptr),
            len,
        }
    }

    /// Leaks the buffer, returning a pointer that from_raw() can reclaim.
    pub(crate) fn into_raw(self) -> *mut u8 {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for SockAddrBuf {
    fn drop(&mut self) {
        if let Ok(layout) = SockAddrBuf::layout(self.len) {
            unsafe { dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

unsafe impl Send for SockAddrBuf {}

impl std::fmt::Debug for SockAddrBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SockAddrBuf").field(&self.as_bytes()).finish()
    }
}

/// Converts a single socket address between the foreign and native layouts.
///
/// `src` and `dst` always have the record's explicit `addrlen`; the length is never inferred from
/// the family. Any error is fatal to the addrinfo conversion in progress.
pub trait SockAddrBridge {
    /// Writes the native form of the foreign address `src` into `dst`.
    fn to_native(&self, src: &[u8], dst: &mut [u8]) -> crate::Result<()>;

    /// Writes the foreign form of the native address `src` into `dst`.
    fn to_foreign(&self, src: &[u8], dst: &mut [u8]) -> crate::Result<()>;
}

/// The bridge for POSIX socket addresses.
///
/// `AF_INET` and `AF_INET6` are converted field by field. Any other family keeps its payload
/// bytes and only has its header rewritten.
#[derive(Clone, Copy, Debug, Default)]
pub struct PosixBridge;

impl SockAddrBridge for PosixBridge {
    fn to_native(&self, src: &[u8], dst: &mut [u8]) -> crate::Result<()> {
        let family = foreign_family(src).ok_or(Error::AddressLength {
            family: 0,
            len: src.len(),
        })?;
        match c_int::from(family) {
            libc::AF_INET => {
                let sin: ForeignSockAddrIn = read_struct(src).ok_or_else(|| short(family, src))?;
                let mut out: libc::sockaddr_in = unsafe { std::mem::zeroed() };
                out.sin_port = sin.sin_port;
                out.sin_addr = sin.sin_addr.to_native();
                write_struct(dst, &out, family)?;
            }
            libc::AF_INET6 => {
                let sin6: ForeignSockAddrIn6 =
                    read_struct(src).ok_or_else(|| short(family, src))?;
                let mut out: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
                out.sin6_port = sin6.sin6_port;
                out.sin6_flowinfo = sin6.sin6_flowinfo;
                out.sin6_addr = sin6.sin6_addr.to_native();
                out.sin6_scope_id = sin6.sin6_scope_id;
                write_struct(dst, &out, family)?;
            }
            _ => copy_payload(src, dst, family)?,
        }
        write_native_header(dst, family);
        Ok(())
    }

    fn to_foreign(&self, src: &[u8], dst: &mut [u8]) -> crate::Result<()> {
        let family = native_family(src).ok_or(Error::AddressLength {
            family: 0,
            len: src.len(),
        })?;
        match c_int::from(family) {
            libc::AF_INET => {
                let sin: libc::sockaddr_in = read_struct(src).ok_or_else(|| short(family, src))?;
                let out = ForeignSockAddrIn {
                    sin_family: family,
                    sin_port: sin.sin_port,
                    sin_addr: crate::ForeignInAddr::from_native(&sin.sin_addr),
                    sin_zero: [0; 8],
                };
                write_struct(dst, &out, family)?;
            }
            libc::AF_INET6 => {
                let sin6: libc::sockaddr_in6 =
                    read_struct(src).ok_or_else(|| short(family, src))?;
                let out = ForeignSockAddrIn6 {
                    sin6_family: family,
                    sin6_port: sin6.sin6_port,
                    sin6_flowinfo: sin6.sin6_flowinfo,
                    sin6_addr: crate::ForeignIn6Addr::from_native(&sin6.sin6_addr),
                    sin6_scope_id: sin6.sin6_scope_id,
                };
                write_struct(dst, &out, family)?;
            }
            _ => copy_payload(src, dst, family)?,
        }
        dst[..HEADER_LEN].copy_from_slice(&family.to_ne_bytes());
        Ok(())
    }
}

fn short(family: u16, buf: &[u8]) -> Error {
    Error::AddressLength {
        family,
        len: buf.len(),
    }
}

fn read_struct<T>(src: &[u8]) -> Option<T> {
    if src.len() < size_of::<T>() {
        return None;
    }
    Some(unsafe { ptr::read_unaligned(src.as_ptr() as *const T) })
}

/// Writes `value` at the start of `dst` and zeroes whatever follows it.
fn write_struct<T>(dst: &mut [u8], value: &T, family: u16) -> crate::Result<()> {
    let size = size_of::<T>();
    if dst.len() < size {
        return Err(short(family, dst));
    }
    unsafe { ptr::copy_nonoverlapping(value as *const T as *const u8, dst.as_mut_ptr(), size) };
    for b in &mut dst[size..] {
        *b = 0;
    }
    Ok(())
}

fn copy_payload(src: &[u8], dst: &mut [u8], family: u16) -> crate::Result<()> {
    if dst.len() < src.len() {
        return Err(short(family, dst));
    }
    dst[HEADER_LEN..src.len()].copy_from_slice(&src[HEADER_LEN..]);
    Ok(())
}

fn foreign_family(src: &[u8]) -> Option<u16> {
    match src {
        [a, b, ..] => Some(u16::from_ne_bytes([*a, *b])),
        _ => None,
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn native_family(src: &[u8]) -> Option<u16> {
    match src {
        [_len, family, ..] => Some(u16::from(*family)),
        _ => None,
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn write_native_header(dst: &mut [u8], family: u16) {
    dst[0] = dst.len().min(u8::MAX as usize) as u8;
    dst[1] = family as u8;
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn native_family(src: &[u8]) -> Option<u16> {
    foreign_family(src)
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn write_native_header(dst: &mut [u8], family: u16) {
    dst[..HEADER_LEN].copy_from_slice(&family.to_ne_bytes());
}

/// Builds the foreign socket address for `addr`.
pub fn foreign_sockaddr(addr: &SocketAddr) -> crate::Result<SockAddrBuf> {
    match addr {
        SocketAddr::V4(addr) => SockAddrBuf::from_value(&ForeignSockAddrIn {
            sin_family: libc::AF_INET as _,
            sin_port: addr.port().to_be(),
            sin_addr: (*addr.ip()).into(),
            sin_zero: [0; 8],
        }),
        SocketAddr::V6(addr) => SockAddrBuf::from_value(&ForeignSockAddrIn6 {
            sin6_family: libc::AF_INET6 as _,
            sin6_port: addr.port().to_be(),
            sin6_flowinfo: addr.flowinfo(),
            sin6_addr: (*addr.ip()).into(),
            sin6_scope_id: addr.scope_id(),
        }),
    }
}

/// Builds the native socket address for `addr`.
pub fn native_sockaddr(addr: &SocketAddr) -> crate::Result<SockAddrBuf> {
    let foreign = foreign_sockaddr(addr)?;
    let mut native = SockAddrBuf::new(foreign.len())?;
    PosixBridge.to_native(foreign.as_bytes(), native.as_bytes_mut())?;
    Ok(native)
}

/// Parses a foreign socket address. Returns None for families other than AF_INET and AF_INET6.
pub fn socketaddr_from_foreign(bytes: &[u8]) -> Option<SocketAddr> {
    match c_int::from(foreign_family(bytes)?) {
        libc::AF_INET => {
            let sin: ForeignSockAddrIn = read_struct(bytes)?;
            Some(SocketAddrV4::new(sin.sin_addr.into(), u16::from_be(sin.sin_port)).into())
        }
        libc::AF_INET6 => {
            let sin6: ForeignSockAddrIn6 = read_struct(bytes)?;
            Some(
                SocketAddrV6::new(
                    sin6.sin6_addr.into(),
                    u16::from_be(sin6.sin6_port),
                    sin6.sin6_flowinfo,
                    sin6.sin6_scope_id,
                )
                .into(),
            )
        }
        _ => None,
    }
}

/// Parses a native socket address. Returns None for families other than AF_INET and AF_INET6.
pub fn socketaddr_from_native(bytes: &[u8]) -> Option<SocketAddr> {
    let mut foreign = vec![0u8; bytes.len()];
    PosixBridge.to_foreign(bytes, &mut foreign).ok()?;
    socketaddr_from_foreign(&foreign)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(foreign: &[u8]) -> Vec<u8> {
        let mut native = SockAddrBuf::new(foreign.len()).unwrap();
        PosixBridge.to_native(foreign, native.as_bytes_mut()).unwrap();
        let mut back = vec![0u8; foreign.len()];
        PosixBridge.to_foreign(native.as_bytes(), &mut back).unwrap();
        back
    }

    #[test]
    fn ipv4_converts_field_by_field() {
        let addr: SocketAddr = "192.0.2.7:8080".parse().unwrap();
        let foreign = foreign_sockaddr(&addr).unwrap();
        assert_eq!(foreign.len(), size_of::<libc::sockaddr_in>());

        let mut native = SockAddrBuf::new(foreign.len()).unwrap();
        PosixBridge
            .to_native(foreign.as_bytes(), native.as_bytes_mut())
            .unwrap();
        let sin: libc::sockaddr_in = read_struct(native.as_bytes()).unwrap();
        assert_eq!(c_int::from(sin.sin_family), libc::AF_INET);
        assert_eq!(u16::from_be(sin.sin_port), 8080);
        assert_eq!((sin.sin_addr.s_addr as u32).to_ne_bytes(), [192, 0, 2, 7]);

        assert_eq!(socketaddr_from_native(native.as_bytes()), Some(addr));
        assert_eq!(round_trip(foreign.as_bytes()), foreign.as_bytes());
    }

    #[test]
    fn ipv6_keeps_flowinfo_and_scope() {
        let addr = SocketAddr::V6(SocketAddrV6::new(
            "fe80::1".parse().unwrap(),
            443,
            7,
            3,
        ));
        let foreign = foreign_sockaddr(&addr).unwrap();
        assert_eq!(socketaddr_from_foreign(foreign.as_bytes()), Some(addr));
        assert_eq!(round_trip(foreign.as_bytes()), foreign.as_bytes());

        let native = native_sockaddr(&addr).unwrap();
        assert_eq!(socketaddr_from_native(native.as_bytes()), Some(addr));
    }

    #[test]
    fn other_families_copy_their_payload() {
        let mut foreign = vec![0u8; 20];
        foreign[..2].copy_from_slice(&(libc::AF_UNIX as u16).to_ne_bytes());
        foreign[2..9].copy_from_slice(b"/tmp/s\0");
        assert_eq!(round_trip(&foreign), foreign);
        assert_eq!(socketaddr_from_foreign(&foreign), None);
    }

    #[test]
    fn trailing_bytes_are_zeroed() {
        let addr: SocketAddr = "10.0.0.1:53".parse().unwrap();
        let mut foreign = foreign_sockaddr(&addr).unwrap().as_bytes().to_vec();
        foreign.resize(size_of::<libc::sockaddr_storage>(), 0xaa);
        let mut native = SockAddrBuf::new(foreign.len()).unwrap();
        PosixBridge
            .to_native(&foreign, native.as_bytes_mut())
            .unwrap();
        let size = size_of::<libc::sockaddr_in>();
        assert!(native.as_bytes()[size..].iter().all(|b| *b == 0));
        assert_eq!(socketaddr_from_native(native.as_bytes()), Some(addr));
    }

    #[test]
    fn short_buffers_are_rejected() {
        let addr: SocketAddr = "10.0.0.1:53".parse().unwrap();
        let foreign = foreign_sockaddr(&addr).unwrap();
        let truncated = &foreign.as_bytes()[..8];
        let mut dst = vec![0u8; truncated.len()];
        assert_eq!(
            PosixBridge.to_native(truncated, &mut dst),
            Err(Error::AddressLength {
                family: libc::AF_INET as u16,
                len: 8
            })
        );

        let mut one = [0u8; 1];
        assert!(PosixBridge.to_native(&[2], &mut one).is_err());
    }

    #[test]
    fn buffers_are_sockaddr_aligned() {
        let buf = SockAddrBuf::new(3).unwrap();
        assert_eq!(buf.as_ptr() as usize % align_of::<libc::sockaddr_storage>(), 0);
        assert_eq!(buf.as_bytes(), &[0, 0, 0]);
    }
}
