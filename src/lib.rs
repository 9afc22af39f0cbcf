//! Marshals address resolution results between a foreign struct layout and the system's own.
//!
//! The system resolver produces a linked list of `struct addrinfo` records. Callers on the other
//! side of the boundary use a fixed, structurally identical layout ([`ForeignAddrInfo`]). This
//! crate converts such lists in both directions ([`convert()`]), owns every record it allocates
//! ([`AddrInfoList`]), and frees converted lists handed out to callers ([`release()`]). The
//! resolver itself is libuv's getaddrinfo/getnameinfo, used synchronously through a [`Loop`].
//!
//! The C entry points live in [`ffi`].
#[macro_use]
extern crate bitflags;
extern crate libuv_sys2 as uv;

pub mod error;
pub use error::*;

mod inner;
use inner::*;

pub mod flags;
pub use flags::*;

pub mod net;
pub use net::*;

pub mod list;
pub use list::*;

pub mod r#loop;
pub use r#loop::*;

mod requests;

pub mod resolver;
pub use resolver::*;

pub mod ffi;

pub type Result<T> = std::result::Result<T, error::Error>;

#[inline]
fn uvret(code: ::std::os::raw::c_int) -> Result<()> {
    if code < 0 {
        Err(Error::Status(code))
    } else {
        Ok(())
    }
}
