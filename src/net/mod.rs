pub mod foreign;
pub use foreign::*;

pub mod sockaddr;
pub use sockaddr::*;

pub mod addrinfo;
pub use addrinfo::*;
