//! GPIO numbering helpers

/// Number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// Parse a line assignment from config
///
/// Supports formats:
/// - "gpio17" -> 17
/// - "GPIO17" -> 17
/// - "17" -> 17
///
/// Inversion (`!`) and pull-up (`^`) prefixes are rejected: bus lines are
/// always open-drain and active-low.
pub fn parse_pin_string(s: &str) -> Option<u8> {
    let s = s.trim();

    let num_str = match s.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("gpio") => &s[4..],
        _ => s,
    };
    if num_str.is_empty() || !num_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let pin: u8 = num_str.parse().ok()?;
    if pin as usize >= GPIO_COUNT {
        return None;
    }

    Some(pin)
}
