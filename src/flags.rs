bitflags! {
    /// Flags carried in the `ai_flags` field of an addrinfo record. Consult man -s 3 getaddrinfo
    /// for their meaning.
    pub struct AddrInfoFlags: i32 {
        /// The returned addresses are intended for bind().
        const PASSIVE = libc::AI_PASSIVE;

        /// Ask for the canonical name of the host in the first record.
        const CANONNAME = libc::AI_CANONNAME;

        /// The node name must be a numeric address string.
        const NUMERICHOST = libc::AI_NUMERICHOST;

        /// The service name must be a numeric port string.
        const NUMERICSERV = libc::AI_NUMERICSERV;

        const V4MAPPED = libc::AI_V4MAPPED;
        const ALL = libc::AI_ALL;
        const ADDRCONFIG = libc::AI_ADDRCONFIG;
    }
}

bitflags! {
    /// Flags to resolve_names(). Consult man -s 3 getnameinfo.
    pub struct NameInfoFlags: i32 {
        const NUMERICHOST = libc::NI_NUMERICHOST;
        const NUMERICSERV = libc::NI_NUMERICSERV;
        const NOFQDN = libc::NI_NOFQDN;
        const NAMEREQD = libc::NI_NAMEREQD;

        /// The service is datagram based (UDP) rather than stream based.
        const DGRAM = libc::NI_DGRAM;
    }
}
