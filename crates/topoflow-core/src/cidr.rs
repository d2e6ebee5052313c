//! IPv4アドレスブロックのヘルパー

use crate::error::{Result, TopologyError};
use ipnet::Ipv4Net;

/// デフォルトルートの宛先
pub const DEFAULT_ROUTE: &str = "0.0.0.0/0";

/// `10.0.1.0/24` のような正規形のIPv4 CIDRブロックをパース
///
/// ホス部は0でなければならない。`10.0.1.5/24` は切り詰めずにエラーとする。
pub fn parse_block(value: &str) -> Result<Ipv4Net> {
    let net: Ipv4Net = value.trim().parse().map_err(|_| TopologyError::InvalidCidr {
        value: value.to_string(),
        reason: "expected an IPv4 block in address/prefix form".to_string(),
    })?;

    if net.trunc() != net {
        return Err(TopologyError::InvalidCidr {
            value: value.to_string(),
            reason: format!("host bits are set, did you mean {}?", net.trunc()),
        });
    }

    Ok(net)
}

/// 2つのブロックが1つ以上のアドレスを共有するか
pub fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

pub fn is_default_route(net: &Ipv4Net) -> bool {
    net.prefix_len() == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block() {
        let net = parse_block("10.0.0.0/16").unwrap();
        assert_eq!(net.prefix_len(), 16);
        assert_eq!(net.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_parse_block_rejects_host_bits() {
        let err = parse_block("10.0.1.5/24").unwrap_err();
        assert!(err.to_string().contains("10.0.1.0/24"));
    }

    #[test]
    fn test_parse_block_rejects_garbage() {
        assert!(parse_block("not-a-cidr").is_err());
        assert!(parse_block("10.0.0.0").is_err());
        assert!(parse_block("10.0.0.0/33").is_err());
        assert!(parse_block("::/0").is_err());
    }

    #[test]
    fn test_overlaps() {
        let a = parse_block("10.0.1.0/24").unwrap();
        let b = parse_block("10.0.2.0/24").unwrap();
        let c = parse_block("10.0.1.128/25").unwrap();
        let all = parse_block("0.0.0.0/0").unwrap();

        assert!(!overlaps(&a, &b));
        assert!(overlaps(&a, &c));
        assert!(overlaps(&c, &a));
        assert!(overlaps(&all, &b));
    }

    #[test]
    fn test_is_default_route() {
        assert!(is_default_route(&parse_block(DEFAULT_ROUTE).unwrap()));
        assert!(!is_default_route(&parse_block("10.0.0.0/8").unwrap()));
    }
}
