use crate::Inner;
use log::warn;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use uv::{uv_loop_close, uv_loop_init, uv_loop_t};

/// A private libuv event loop, used to issue resolver requests in libuv's synchronous mode.
///
/// Requests issued through a Loop never run callbacks and never leave work queued on it, so the
/// loop itself is never run. A Loop must stay on the thread that created it; concurrent callers
/// each create their own. Whether concurrent lookups are safe is then up to the system's
/// getaddrinfo(3) and getnameinfo(3).
pub struct Loop {
    handle: *mut uv_loop_t,
}

impl Loop {
    /// Creates a new Loop.
    pub fn new() -> crate::Result<Loop> {
        let layout = Layout::new::<uv_loop_t>();
        let handle = unsafe { alloc_zeroed(layout) as *mut uv_loop_t };
        if handle.is_null() {
            return Err(crate::Error::OutOfMemory);
        }

        if let Err(e) = crate::uvret(unsafe { uv_loop_init(handle) }) {
            unsafe { dealloc(handle as _, layout) };
            return Err(e);
        }

        Ok(Loop { handle })
    }
}

impl Inner<*mut uv_loop_t> for Loop {
    fn inner(&self) -> *mut uv_loop_t {
        self.handle
    }
}

impl Drop for Loop {
    fn drop(&mut self) {
        match crate::uvret(unsafe { uv_loop_close(self.handle) }) {
            Ok(()) => unsafe { dealloc(self.handle as _, Layout::new::<uv_loop_t>()) },
            // still referenced by libuv, so the memory is leaked
            Err(e) => warn!("failed to close resolver loop: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loops_open_and_close() {
        let first = Loop::new().unwrap();
        let second = Loop::new().unwrap();
        assert_ne!(first.inner(), second.inner());
    }
}
