//! C ABI for callers using the foreign layout.
//!
//! Every call creates its own [`Loop`], so nothing is shared between calls or threads. Statuses
//! are returned exactly as libuv reports them (0 on success, a negative UV_EAI_* or UV_E* code
//! otherwise); failures of the bridge itself are reported with the BRIDGE_* codes, which libuv
//! never produces.
use crate::{release, resolve_address_raw, resolve_names, ForeignAddrInfo, ForeignSockAddr};
use crate::{ForeignSockLen, Loop, NameInfoFlags, PosixBridge};
use std::os::raw::{c_char, c_int};
use std::ptr;

/// getaddrinfo(3) in the foreign layout.
///
/// On success the first record is written into `*res`, which the caller owns, and the rest of
/// the list must later be freed with addrinfo_bridge_freeaddrinfo(). On failure an empty record
/// is written instead. `hints` may be null.
///
/// # Safety
///
/// `name` and `service` must be null or nul-terminated strings. `hints` must be null or a
/// finite, acyclic foreign list whose address buffers are `ai_addrlen` bytes. `res` must be
/// valid for writes.
#[no_mangle]
pub unsafe extern "C" fn addrinfo_bridge_getaddrinfo(
    name: *const c_char,
    service: *const c_char,
    hints: *const ForeignAddrInfo,
    res: *mut ForeignAddrInfo,
) -> c_int {
    let result = Loop::new().and_then(|resolver| {
        resolve_address_raw(
            &resolver,
            crate::opt_cstr(name),
            crate::opt_cstr(service),
            hints.as_ref(),
            &PosixBridge,
        )
    });
    match result {
        Ok(list) => {
            if !res.is_null() {
                ptr::write(res, list.into_head());
            }
            0
        }
        Err(e) => {
            if !res.is_null() {
                ptr::write(res, ForeignAddrInfo::default());
            }
            e.code()
        }
    }
}

/// Frees records 2..N of a list produced by addrinfo_bridge_getaddrinfo(). The first record,
/// including its address and canonical name, is left alone. A null `head` is ignored.
///
/// # Safety
///
/// `head` must be null or the record filled in by a successful addrinfo_bridge_getaddrinfo()
/// whose list has not been freed yet. Passing any other list, or the same list twice, is
/// undefined behavior.
#[no_mangle]
pub unsafe extern "C" fn addrinfo_bridge_freeaddrinfo(head: *mut ForeignAddrInfo) {
    release(head as *const ForeignAddrInfo);
}

/// getnameinfo(3) on a foreign socket address of `addrlen` bytes.
///
/// Host and service names are written nul-terminated into the caller's buffers, which are only
/// meaningful when 0 is returned. A null buffer or zero length skips that name.
///
/// # Safety
///
/// `addr` must be valid for `addrlen` bytes. `host` and `serv` must be null or valid for
/// `hostlen` and `servlen` bytes respectively.
#[no_mangle]
pub unsafe extern "C" fn addrinfo_bridge_getnameinfo(
    addr: *const ForeignSockAddr,
    addrlen: ForeignSockLen,
    host: *mut c_char,
    hostlen: ForeignSockLen,
    serv: *mut c_char,
    servlen: ForeignSockLen,
    flags: c_int,
) -> c_int {
    if addr.is_null() {
        return crate::Error::AddressLength { family: 0, len: 0 }.code();
    }
    let addr = std::slice::from_raw_parts(addr as *const u8, addrlen as usize);
    let host = out_buf(host, hostlen);
    let serv = out_buf(serv, servlen);
    // Bits this crate does not name (NI_IDN and friends) still reach the lookup.
    let flags = NameInfoFlags::from_bits_unchecked(flags);

    let result = Loop::new().and_then(|resolver| {
        resolve_names(&resolver, addr, flags, host, serv, &PosixBridge)
    });
    match result {
        Ok(()) => 0,
        Err(e) => e.code(),
    }
}

/// A static message describing `code`, either a libuv status or one of the BRIDGE_* codes.
#[no_mangle]
pub extern "C" fn addrinfo_bridge_strerror(code: c_int) -> *const c_char {
    crate::strerror(code)
}

unsafe fn out_buf<'a>(ptr: *mut c_char, len: ForeignSockLen) -> &'a mut [u8] {
    if ptr.is_null() {
        &mut []
    } else {
        std::slice::from_raw_parts_mut(ptr as *mut u8, len as usize)
    }
}
