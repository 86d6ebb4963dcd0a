//! JSON-RPC quantity decoding and ether formatting

use crate::error::RpcError;

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Decode a hex quantity such as `"0x1b4"`
pub fn parse_quantity(raw: &str) -> Result<u128, RpcError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| RpcError::Malformed(format!("quantity without 0x prefix: {}", raw)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Malformed(format!("bad quantity {}: {}", raw, e)))
}

/// Decode a hex quantity that must fit in 64 bits
pub fn parse_u64(raw: &str) -> Result<u64, RpcError> {
    let value = parse_quantity(raw)?;
    u64::try_from(value).map_err(|_| RpcError::Malformed(format!("quantity overflows u64: {}", raw)))
}

/// Format a wei amount as a decimal ether string without trailing zeros
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let frac = wei % WEI_PER_ETHER;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert_eq!(parse_quantity("0x").unwrap(), 0);
    }

    #[test]
    fn test_parse_quantity_rejects_garbage() {
        assert!(matches!(parse_quantity("1b4"), Err(RpcError::Malformed(_))));
        assert!(matches!(parse_quantity("0xzz"), Err(RpcError::Malformed(_))));
    }

    #[test]
    fn test_parse_u64_overflow() {
        assert!(parse_u64("0xffffffffffffffffff").is_err());
        assert_eq!(parse_u64("0xffffffffffffffff").unwrap(), u64::MAX);
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(0), "0");
        assert_eq!(format_ether(WEI_PER_ETHER), "1");
        assert_eq!(format_ether(20_000_000_000), "0.00000002");
        assert_eq!(format_ether(WEI_PER_ETHER * 3 / 2), "1.5");
    }
}
