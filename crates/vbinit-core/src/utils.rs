//! Number parsing and hex formatting shared by the image dumper, fixtures and CLI.

/// Error returned by [`parse_number`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseNumberError {
    #[error("empty number")]
    Empty,
    #[error("invalid number `{0}`")]
    Invalid(String),
}

/// Parse an unsigned number written as decimal, `0x` hex or `0b` binary.
///
/// Underscores are accepted as digit separators.
///
/// # Examples
/// ```
/// use vbinit_core::utils::parse_number;
/// assert_eq!(parse_number("0x3d4"), Ok(0x3d4));
/// assert_eq!(parse_number("1_000"), Ok(1000));
/// assert_eq!(parse_number("0b101"), Ok(5));
/// ```
pub fn parse_number(text: &str) -> Result<u64, ParseNumberError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseNumberError::Empty);
    }

    let (digits, radix) = if let Some(rest) = strip_prefix_ci(trimmed, "0x") {
        (rest, 16)
    } else if let Some(rest) = strip_prefix_ci(trimmed, "0b") {
        (rest, 2)
    } else {
        (trimmed, 10)
    };

    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return Err(ParseNumberError::Invalid(text.to_string()));
    }
    u64::from_str_radix(&cleaned, radix).map_err(|_| ParseNumberError::Invalid(text.to_string()))
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

/// Number of hex digits needed to print every offset below `len`.
///
/// Never less than 4, so small images still line up with 16-bit pointers.
///
/// # Examples
/// ```
/// use vbinit_core::utils::hex_width_for_len;
/// assert_eq!(hex_width_for_len(0x100), 4);
/// assert_eq!(hex_width_for_len(0x10000), 4);
/// assert_eq!(hex_width_for_len(0x10001), 5);
/// ```
pub fn hex_width_for_len(len: usize) -> usize {
    let max = len.saturating_sub(1);
    let bits = usize::BITS - max.leading_zeros();
    (bits.div_ceil(4) as usize).max(4)
}

/// Format a byte slice as space-separated hex pairs.
///
/// # Examples
/// ```
/// use vbinit_core::utils::hex_bytes;
/// assert_eq!(hex_bytes(&[0x75, 0x00, 0x71]), "75 00 71");
/// ```
pub fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02x}"));
    }
    out
}
