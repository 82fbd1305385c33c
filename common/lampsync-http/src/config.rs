use std::net::SocketAddr;

/// Resolves the listen address from `BIND_ADDR`, falling back to `default`
/// when the variable is unset or unparseable.
pub fn bind_addr(default: SocketAddr) -> SocketAddr {
    let Ok(val) = std::env::var("BIND_ADDR") else {
        return default;
    };
    parse_or(&val, default)
}

fn parse_or(val: &str, default: SocketAddr) -> SocketAddr {
    match val.trim().parse() {
        Ok(addr) => addr,
        Err(err) => {
            ::tracing::warn!(value = %val, error = %err, %default, "invalid BIND_ADDR, using default");
            default
        }
    }
}
