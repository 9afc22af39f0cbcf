//! Internal utilities
use std::ffi::CStr;
use std::os::raw::c_char;

/// An internal version of From<T>
#[doc(hidden)]
pub trait FromInner<T>: Sized {
    fn from_inner(_: T) -> Self;
}

/// Access to the raw libuv object behind a wrapper
#[doc(hidden)]
pub(crate) trait Inner<T> {
    fn inner(&self) -> T;
}

/// Borrow a nullable C string
pub(crate) unsafe fn opt_cstr<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr))
    }
}

/// Convert a nul-terminated byte buffer to a String, stopping at the first nul
pub(crate) fn buf_to_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
