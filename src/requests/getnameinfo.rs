use crate::Inner;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ffi::CStr;
use uv::{uv_errno_t_UV_EAI_OVERFLOW, uv_getnameinfo, uv_getnameinfo_t};

/// GetNameInfo request type. Requests are always issued synchronously, without a callback.
pub(crate) struct GetNameInfoReq {
    req: *mut uv_getnameinfo_t,
}

impl GetNameInfoReq {
    /// Create a new GetNameInfo request
    pub fn new() -> crate::Result<GetNameInfoReq> {
        let layout = Layout::new::<uv_getnameinfo_t>();
        let req = unsafe { alloc_zeroed(layout) as *mut uv_getnameinfo_t };
        if req.is_null() {
            return Err(crate::Error::OutOfMemory);
        }

        Ok(GetNameInfoReq { req })
    }

    /// Returns the host result
    fn host(&self) -> &CStr {
        unsafe { CStr::from_ptr((*self.req).host.as_ptr()) }
    }

    /// Returns the service result
    fn service(&self) -> &CStr {
        unsafe { CStr::from_ptr((*self.req).service.as_ptr()) }
    }
}

impl Inner<*mut uv_getnameinfo_t> for GetNameInfoReq {
    fn inner(&self) -> *mut uv_getnameinfo_t {
        self.req
    }
}

impl Drop for GetNameInfoReq {
    fn drop(&mut self) {
        let layout = Layout::new::<uv_getnameinfo_t>();
        unsafe { dealloc(self.req as _, layout) };
    }
}

/// Copies `name` with its terminator into `dst`. An empty `dst` means the name was not asked
/// for; one that is too short yields UV_EAI_OVERFLOW, as getnameinfo(3) does.
fn copy_name(name: &CStr, dst: &mut [u8]) -> crate::Result<()> {
    if dst.is_empty() {
        return Ok(());
    }
    let bytes = name.to_bytes_with_nul();
    if bytes.len() > dst.len() {
        return Err(crate::Error::Status(uv_errno_t_UV_EAI_OVERFLOW as _));
    }
    dst[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

impl crate::Loop {
    /// Synchronous getnameinfo(3).
    ///
    /// `addr` is a native socket address. The host and service names are written, nul-terminated,
    /// into `host` and `service`; their contents are only meaningful when Ok is returned.
    ///
    /// flags is the bitwise OR of NI_* constants
    pub(crate) fn getnameinfo_sync(
        &self,
        addr: &crate::SockAddrBuf,
        flags: crate::NameInfoFlags,
        host: &mut [u8],
        service: &mut [u8],
    ) -> crate::Result<()> {
        let req = GetNameInfoReq::new()?;
        // uv_getnameinfo() takes no length; libuv derives it from sa_family, so addr.len() is
        // only checked by the bridge that filled the buffer.
        crate::uvret(unsafe {
            uv_getnameinfo(
                self.inner(),
                req.inner(),
                None,
                addr.as_ptr() as *const uv::sockaddr,
                flags.bits(),
            )
        })?;
        copy_name(req.host(), host)?;
        copy_name(req.service(), service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_copied_with_their_terminator() {
        let mut buf = [0xffu8; 8];
        copy_name(CStr::from_bytes_with_nul(b"http\0").unwrap(), &mut buf).unwrap();
        assert_eq!(&buf[..5], b"http\0");
    }

    #[test]
    fn short_buffers_overflow() {
        let mut buf = [0u8; 4];
        let err = copy_name(CStr::from_bytes_with_nul(b"http\0").unwrap(), &mut buf).unwrap_err();
        assert_eq!(err.code(), uv_errno_t_UV_EAI_OVERFLOW as i32);
        assert!(err.is_status());
    }

    #[test]
    fn unrequested_names_are_skipped() {
        copy_name(CStr::from_bytes_with_nul(b"localhost\0").unwrap(), &mut []).unwrap();
    }
}
