//! Small stateless helpers shared across modules.

use regex::Regex;
use std::sync::OnceLock;

fn ipv4_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b")
            .expect("static regex is valid")
    })
}

/// Replaces IPv4-looking substrings in an error message with a fixed
/// placeholder before the message is persisted on an alert (spec §4.4,
/// §7 "User-visible IP-like substrings inside error messages destined for
/// alerts are obfuscated before persistence").
pub fn obfuscate_ips(message: &str) -> String {
    ipv4_regex().replace_all(message, "[redacted-ip]").into_owned()
}
