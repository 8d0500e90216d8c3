//! The address other devices on the network use to reach the web server.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Outbound interface address, or loopback when there is no route.
///
/// Connecting a UDP socket sends nothing; it only asks the kernel which
/// local address it would route from.
pub fn local_ip() -> IpAddr {
    let routed = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).and_then(|socket| {
        socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
        socket.local_addr()
    });

    match routed {
        Ok(addr) if !addr.ip().is_unspecified() => addr.ip(),
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            tracing::debug!("No outbound route, falling back to loopback: {e}");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

/// `http://<host-ip>:<port>`.
pub fn web_address(port: u16) -> String {
    format!("http://{}:{port}", local_ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_address_uses_port() {
        let address = web_address(5000);
        assert!(address.starts_with("http://"));
        assert!(address.ends_with(":5000"));
    }

    #[test]
    fn test_local_ip_is_never_unspecified() {
        assert!(!local_ip().is_unspecified());
    }
}
