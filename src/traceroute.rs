//! Traceroute output parsing.
//!
//! Parsing is a best-effort enhancement: when no hop line is recognised the
//! caller shows the raw output instead.

use serde::Serialize;

use crate::models::UplinkHop;

/// Maximum characters of the first output line quoted in the summary.
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TracerouteHop {
    pub hop: String,
    pub hostname: String,
    pub ip: String,
    pub ping: String,
}

/// Parses hop lines of `traceroute` output.
///
/// Line 0 is the header. Every later line that splits into at least four
/// whitespace-separated tokens `hop hostname (ip) ping ...` is a hop; the
/// parentheses around the IP are stripped. Shorter lines are skipped.
pub fn parse_hops(text: &str) -> Vec<TracerouteHop> {
    text.lines().skip(1).filter_map(parse_hop_line).collect()
}

fn parse_hop_line(line: &str) -> Option<TracerouteHop> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }

    Some(TracerouteHop {
        hop: tokens[0].to_string(),
        hostname: tokens[1].to_string(),
        ip: tokens[2].trim_matches(|c| c == '(' || c == ')').to_string(),
        ping: tokens[3].to_string(),
    })
}

/// Uplink pings arrive as bare milliseconds; parsed hops carry the unit.
fn ping_ms(ping: &str) -> String {
    let ping = ping.trim();
    if ping.is_empty() || ping.ends_with("ms") {
        ping.to_string()
    } else {
        format!("{}ms", ping)
    }
}

/// Converts the node's pre-computed uplink trace; `host` wins over `hostname`.
pub fn from_uplink(hops: &[UplinkHop]) -> Vec<TracerouteHop> {
    hops.iter()
        .map(|h| TracerouteHop {
            hop: h.hop.clone(),
            hostname: h
                .host
                .clone()
                .or_else(|| h.hostname.clone())
                .unwrap_or_default(),
            ip: h.ip.clone(),
            ping: ping_ms(&h.ping),
        })
        .collect()
}

/// One-line status shown above the traceroute result.
pub fn summary(text: &str, hops: &[TracerouteHop]) -> String {
    if !hops.is_empty() {
        return format!("Traceroute: {} hop(s)", hops.len());
    }

    let first = text.lines().next().unwrap_or(text);
    let preview = if first.chars().count() > PREVIEW_CHARS {
        let truncated: String = first.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        first.to_string()
    };
    format!("Traceroute: no hops parsed. First line: {}", preview)
}
