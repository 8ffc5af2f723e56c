//! Loopback availability for tests that bind local ports.
//!
//! Some sandboxed runners refuse to bind even on 127.0.0.1. Tests that need a
//! port skip there, unless `VULNSCAN_REQUIRE_SOCKET_TESTS` is set to a value
//! other than `0`, in which case they fail.

use std::net::{Ipv4Addr, TcpListener};
use std::panic::Location;
use std::sync::OnceLock;

const REQUIRE_ENV: &str = "VULNSCAN_REQUIRE_SOCKET_TESTS";

fn loopback_bindable() -> bool {
    static BINDABLE: OnceLock<bool> = OnceLock::new();
    *BINDABLE.get_or_init(|| TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).is_ok())
}

fn sockets_required() -> bool {
    std::env::var(REQUIRE_ENV).is_ok_and(|value| !value.is_empty() && value != "0")
}

/// Returns `false` when the calling test should return early.
#[track_caller]
pub fn loopback_or_skip() -> bool {
    if loopback_bindable() {
        return true;
    }
    let caller = Location::caller();
    assert!(
        !sockets_required(),
        "{REQUIRE_ENV} is set but 127.0.0.1 cannot be bound ({caller})"
    );
    eprintln!("skipping test at {caller}: 127.0.0.1 cannot be bound");
    false
}
