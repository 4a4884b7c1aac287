use serde::{Deserialize, Serialize};
use std::fmt;

/// A covered asset: either a fiat-backed/crypto-collateralized stablecoin or a
/// native crypto asset. Only the 14 stablecoin variants are used for pricing
/// (§3 Asset); BTC/ETH exist for completeness of the tagged variant and for
/// policies written directly on native assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Usdc,
    Usdt,
    Usdp,
    Dai,
    Frax,
    Busd,
    Pyusd,
    Gho,
    Lusd,
    CrvUsd,
    MkUsd,
    Usde,
    SUsde,
    Usdy,
    Btc,
    Eth,
}

impl Asset {
    /// The 14 stablecoins eligible for pricing (§3).
    pub const STABLECOINS: [Asset; 14] = [
        Asset::Usdc,
        Asset::Usdt,
        Asset::Usdp,
        Asset::Dai,
        Asset::Frax,
        Asset::Busd,
        Asset::Pyusd,
        Asset::Gho,
        Asset::Lusd,
        Asset::CrvUsd,
        Asset::MkUsd,
        Asset::Usde,
        Asset::SUsde,
        Asset::Usdy,
    ];

    pub fn is_stablecoin(self) -> bool {
        !matches!(self, Asset::Btc | Asset::Eth)
    }

    /// Stable integer id used in on-chain payloads and product hashing (§6).
    pub fn id(self) -> u8 {
        match self {
            Asset::Usdc => 0,
            Asset::Usdt => 1,
            Asset::Usdp => 2,
            Asset::Dai => 3,
            Asset::Frax => 4,
            Asset::Busd => 5,
            Asset::Usde => 6,
            Asset::SUsde => 7,
            Asset::Usdy => 8,
            Asset::Pyusd => 9,
            Asset::Gho => 10,
            Asset::Lusd => 11,
            Asset::CrvUsd => 12,
            Asset::MkUsd => 13,
            Asset::Btc => 100,
            Asset::Eth => 101,
        }
    }

    /// Correlated-asset group used by the concentration model (§4.6). Returns
    /// `None` for assets outside the three named groups (BTC, ETH).
    pub fn correlation_group(self) -> Option<CorrelationGroup> {
        match self {
            Asset::Usdc | Asset::Usdt | Asset::Usdp => Some(CorrelationGroup::FiatBacked),
            Asset::Dai | Asset::Lusd | Asset::Gho | Asset::CrvUsd | Asset::MkUsd => {
                Some(CorrelationGroup::CryptoCollateralized)
            }
            Asset::Usde | Asset::SUsde | Asset::Usdy => Some(CorrelationGroup::YieldBearing),
            Asset::Frax | Asset::Busd | Asset::Pyusd => None,
            Asset::Btc | Asset::Eth => None,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Asset::Usdc => "USDC",
            Asset::Usdt => "USDT",
            Asset::Usdp => "USDP",
            Asset::Dai => "DAI",
            Asset::Frax => "FRAX",
            Asset::Busd => "BUSD",
            Asset::Pyusd => "PYUSD",
            Asset::Gho => "GHO",
            Asset::Lusd => "LUSD",
            Asset::CrvUsd => "crvUSD",
            Asset::MkUsd => "mkUSD",
            Asset::Usde => "USDe",
            Asset::SUsde => "sUSDe",
            Asset::Usdy => "USDY",
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::STABLECOINS
            .into_iter()
            .chain([Asset::Btc, Asset::Eth])
            .find(|a| a.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown asset: {s}"))
    }
}

/// Groups of stablecoins whose depeg risk tends to move together (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationGroup {
    FiatBacked,
    CryptoCollateralized,
    YieldBearing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stablecoin_ids_match_id_table() {
        assert_eq!(Asset::Usdc.id(), 0);
        assert_eq!(Asset::Usdt.id(), 1);
        assert_eq!(Asset::MkUsd.id(), 13);
    }

    #[test]
    fn stablecoins_list_has_14_entries() {
        assert_eq!(Asset::STABLECOINS.len(), 14);
        assert!(Asset::STABLECOINS.iter().all(|a| a.is_stablecoin()));
    }
}
