use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use uv::{uv_err_name, uv_strerror};

// libuv's own statuses stay above -4100 on every unix target; the bridge's codes sit below that.

/// Status for [`Error::OutOfMemory`] across the C ABI.
pub const BRIDGE_ENOMEM: c_int = -5001;

/// Status for [`Error::AddressLength`] across the C ABI.
pub const BRIDGE_EADDRLEN: c_int = -5002;

/// Status for [`Error::InteriorNul`] across the C ABI.
pub const BRIDGE_ENUL: c_int = -5003;

static BRIDGE_ERRORS: [(c_int, &str, &[u8]); 3] = [
    (
        BRIDGE_ENOMEM,
        "BRIDGE_ENOMEM",
        b"out of memory while converting address records\0",
    ),
    (
        BRIDGE_EADDRLEN,
        "BRIDGE_EADDRLEN",
        b"socket address too short for its family\0",
    ),
    (
        BRIDGE_ENUL,
        "BRIDGE_ENUL",
        b"name contains an interior nul byte\0",
    ),
];

fn bridge_error(code: c_int) -> Option<&'static (c_int, &'static str, &'static [u8])> {
    BRIDGE_ERRORS.iter().find(|(c, _, _)| *c == code)
}

/// A static, nul-terminated message for any status this crate reports: one of the BRIDGE_*
/// codes, or anything libuv knows.
pub fn strerror(code: c_int) -> *const c_char {
    match bridge_error(code) {
        Some((_, _, message)) => message.as_ptr() as *const c_char,
        None => unsafe { uv_strerror(code) },
    }
}

/// Errors produced while converting or resolving address records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A status reported by libuv or the system resolver, passed through unchanged.
    Status(c_int),

    /// Memory for a converted record or socket address could not be obtained. A conversion that
    /// fails this way never returns a partially linked list.
    OutOfMemory,

    /// A socket address buffer is shorter than its family requires.
    AddressLength { family: u16, len: usize },

    /// A host or service name contained an interior nul byte.
    InteriorNul,
}

impl Error {
    /// The status code reported across the C ABI. Resolver statuses are returned verbatim; the
    /// bridge's own failures use the BRIDGE_* codes, which libuv never returns.
    pub fn code(&self) -> c_int {
        match self {
            Error::Status(code) => *code,
            Error::OutOfMemory => BRIDGE_ENOMEM,
            Error::AddressLength { .. } => BRIDGE_EADDRLEN,
            Error::InteriorNul => BRIDGE_ENUL,
        }
    }

    /// Returns true if this error was reported by the resolver rather than by the bridge.
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status(_))
    }

    /// The name of the error.
    pub fn name(&self) -> String {
        match bridge_error(self.code()) {
            Some((_, name, _)) => (*name).to_string(),
            None => unsafe { CStr::from_ptr(uv_err_name(self.code())) }
                .to_string_lossy()
                .into_owned(),
        }
    }

    /// A message for the error.
    pub fn message(&self) -> String {
        unsafe { CStr::from_ptr(strerror(self.code())) }
            .to_string_lossy()
            .into_owned()
    }
}

impl From<std::ffi::NulError> for Error {
    fn from(_: std::ffi::NulError) -> Error {
        Error::InteriorNul
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Status(_) => write!(f, "{}: {}", self.name(), self.message()),
            Error::OutOfMemory => f.write_str("out of memory while converting address records"),
            Error::AddressLength { family, len } => write!(
                f,
                "socket address of family {} does not fit in {} bytes",
                family, len
            ),
            Error::InteriorNul => f.write_str("name contains an interior nul byte"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_pass_through() {
        let err = Error::Status(uv::uv_errno_t_UV_EAI_NONAME as _);
        assert!(err.is_status());
        assert_eq!(err.code(), uv::uv_errno_t_UV_EAI_NONAME as c_int);
        assert_eq!(err.name(), "EAI_NONAME");
    }

    #[test]
    fn bridge_failures_stay_out_of_the_resolver_taxonomy() {
        let short = Error::AddressLength { family: 2, len: 3 };
        let bridge = [Error::OutOfMemory, short, Error::InteriorNul];
        let libuv = [
            uv::uv_errno_t_UV_ENOMEM as c_int,
            uv::uv_errno_t_UV_EINVAL as c_int,
            uv::uv_errno_t_UV_EAI_MEMORY as c_int,
            uv::uv_errno_t_UV_EAI_NONAME as c_int,
            uv::uv_errno_t_UV_EOF as c_int,
            uv::uv_errno_t_UV_UNKNOWN as c_int,
        ];
        for err in bridge.iter() {
            assert!(!err.is_status());
            assert!(!libuv.contains(&err.code()), "{:?} collides with libuv", err);
        }
        assert_eq!(Error::OutOfMemory.code(), BRIDGE_ENOMEM);
        assert_eq!(short.code(), BRIDGE_EADDRLEN);
        assert_eq!(Error::InteriorNul.code(), BRIDGE_ENUL);
        assert_eq!(
            short.to_string(),
            "socket address of family 2 does not fit in 3 bytes"
        );
    }

    #[test]
    fn bridge_codes_have_names_and_messages() {
        let short = Error::AddressLength { family: 10, len: 8 };
        assert_eq!(short.name(), "BRIDGE_EADDRLEN");
        assert_eq!(short.message(), "socket address too short for its family");
        assert_eq!(Error::InteriorNul.name(), "BRIDGE_ENUL");

        let einval = unsafe { CStr::from_ptr(strerror(uv::uv_errno_t_UV_EINVAL as c_int)) };
        assert_eq!(einval.to_str().unwrap(), "invalid argument");
    }
}
