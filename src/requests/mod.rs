pub(crate) mod getaddrinfo;
pub(crate) mod getnameinfo;
