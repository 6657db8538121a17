//! Common utilities and helper functions

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use uuid::Uuid;

/// Address the UDP probe "connects" to; no packet is sent
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Best guess at this machine's LAN address
///
/// Connecting a UDP socket only selects a route, so the socket's local
/// address is the interface the OS would use. Falls back to `127.0.0.1`
/// when no route exists.
pub fn resolve_local_ip() -> IpAddr {
    probe_local_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn probe_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}

/// First `len` hex characters of a random UUID (at most 32)
pub fn short_hex_id(len: usize) -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(len);
    hex
}

/// Default worker identifier, `worker-` followed by 8 hex characters
pub fn generate_node_id() -> String {
    format!("worker-{}", short_hex_id(8))
}
