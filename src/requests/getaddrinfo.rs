use crate::Inner;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ffi::CStr;
use std::ptr::{self, NonNull};
use uv::{uv_errno_t_UV_EAI_NONAME, uv_freeaddrinfo, uv_getaddrinfo, uv_getaddrinfo_t};

/// GetAddrInfo request type. Requests are always issued synchronously, without a callback.
pub(crate) struct GetAddrInfoReq {
    req: *mut uv_getaddrinfo_t,
}

impl GetAddrInfoReq {
    /// Create a new GetAddrInfo request
    pub fn new() -> crate::Result<GetAddrInfoReq> {
        let layout = Layout::new::<uv_getaddrinfo_t>();
        let req = unsafe { alloc_zeroed(layout) as *mut uv_getaddrinfo_t };
        if req.is_null() {
            return Err(crate::Error::OutOfMemory);
        }

        Ok(GetAddrInfoReq { req })
    }

    /// Takes the result list away from the request. The caller must release it with
    /// freeaddrinfo().
    fn take_addrinfo(&mut self) -> Option<NonNull<libc::addrinfo>> {
        let ai = unsafe { (*self.req).addrinfo };
        unsafe { (*self.req).addrinfo = ptr::null_mut() };
        NonNull::new(ai as *mut libc::addrinfo)
    }
}

impl Inner<*mut uv_getaddrinfo_t> for GetAddrInfoReq {
    fn inner(&self) -> *mut uv_getaddrinfo_t {
        self.req
    }
}

impl Drop for GetAddrInfoReq {
    fn drop(&mut self) {
        if let Some(ai) = self.take_addrinfo() {
            unsafe { freeaddrinfo(ai) };
        }

        let layout = Layout::new::<uv_getaddrinfo_t>();
        unsafe { dealloc(self.req as _, layout) };
    }
}

/// Releases a list produced by Loop::getaddrinfo_sync().
///
/// # Safety
///
/// `ai` must be the unreleased head of such a list.
pub(crate) unsafe fn freeaddrinfo(ai: NonNull<libc::addrinfo>) {
    uv_freeaddrinfo(ai.as_ptr() as *mut uv::addrinfo);
}

impl crate::Loop {
    /// Synchronous getaddrinfo(3).
    ///
    /// Either node or service may be None but not both. hints, when given, is passed to the system
    /// as is. On success returns the head of a list that must be released with freeaddrinfo(); on
    /// failure returns the status libuv reported.
    pub(crate) fn getaddrinfo_sync(
        &self,
        node: Option<&CStr>,
        service: Option<&CStr>,
        hints: Option<&libc::addrinfo>,
    ) -> crate::Result<NonNull<libc::addrinfo>> {
        let mut req = GetAddrInfoReq::new()?;
        crate::uvret(unsafe {
            uv_getaddrinfo(
                self.inner(),
                req.inner(),
                None,
                node.map_or(ptr::null(), CStr::as_ptr),
                service.map_or(ptr::null(), CStr::as_ptr),
                hints.map_or(ptr::null(), |h| {
                    h as *const libc::addrinfo as *const uv::addrinfo
                }),
            )
        })?;
        req.take_addrinfo()
            .ok_or(crate::Error::Status(uv_errno_t_UV_EAI_NONAME as _))
    }
}
