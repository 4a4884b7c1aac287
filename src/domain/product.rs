use super::{Asset, Blockchain, CoverageType};
use serde::{Deserialize, Serialize};

/// `(CoverageType, Blockchain, Asset)` — identifies one catalog entry (§3).
/// The nominal catalog is the full cross product of 5 coverage types, 8
/// chains and the 14 pricing stablecoins (560 combinations); `is_compatible`
/// narrows that to the chain/asset pairs that are actually underwritable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub coverage_type: CoverageType,
    pub chain: Blockchain,
    pub asset: Asset,
}

impl ProductKey {
    pub fn new(coverage_type: CoverageType, chain: Blockchain, asset: Asset) -> Self {
        Self {
            coverage_type,
            chain,
            asset,
        }
    }

    /// `(cov << 16) | (chain << 8) | asset` (§3, §6). Injective over the
    /// valid domain because each field is byte-sized and non-overlapping.
    pub fn hash(self) -> u32 {
        ((self.coverage_type.id() as u32) << 16)
            | ((self.chain.id() as u32) << 8)
            | (self.asset.id() as u32)
    }

    /// Inverse of `hash`; only meaningful for ids produced by `hash` on a
    /// value with a stablecoin asset id (< 100, §3 "14 stablecoins").
    pub fn decompose(hash: u32) -> Option<ProductKey> {
        let cov_id = ((hash >> 16) & 0xFF) as u8;
        let chain_id = ((hash >> 8) & 0xFF) as u8;
        let asset_id = (hash & 0xFF) as u8;

        let coverage_type = CoverageType::ALL.into_iter().find(|c| c.id() == cov_id)?;
        let chain = Blockchain::ALL.into_iter().find(|c| c.id() == chain_id)?;
        let asset = Asset::STABLECOINS.into_iter().find(|a| a.id() == asset_id)?;

        Some(ProductKey::new(coverage_type, chain, asset))
    }

    pub fn name(self) -> String {
        format!("{}-{}-{}", self.coverage_type, self.chain, self.asset)
    }
}

/// Restricts the valid (chain, asset) domain: Bitcoin supports USDT only;
/// Lightning supports USDT and USDC; every other chain supports the full
/// stablecoin set (§3).
pub fn is_chain_stablecoin_compatible(chain: Blockchain, asset: Asset) -> bool {
    if !asset.is_stablecoin() {
        return false;
    }
    match chain {
        Blockchain::Bitcoin => matches!(asset, Asset::Usdt),
        Blockchain::Lightning => matches!(asset, Asset::Usdt | Asset::Usdc),
        _ => true,
    }
}

pub fn is_product_compatible(key: ProductKey) -> bool {
    is_chain_stablecoin_compatible(key.chain, key.asset)
}

/// The full nominal catalog: 5 × 8 × 14 = 560 entries (§2, §3).
pub fn full_catalog() -> Vec<ProductKey> {
    let mut out = Vec::with_capacity(560);
    for coverage_type in CoverageType::ALL {
        for chain in Blockchain::ALL {
            for asset in Asset::STABLECOINS {
                out.push(ProductKey::new(coverage_type, chain, asset));
            }
        }
    }
    out
}

/// Entries of the full catalog that are actually underwritable.
pub fn valid_catalog() -> Vec<ProductKey> {
    full_catalog()
        .into_iter()
        .filter(|k| is_product_compatible(*k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_catalog_has_560_entries() {
        assert_eq!(full_catalog().len(), 560);
    }

    #[test]
    fn bitcoin_supports_usdt_only() {
        assert!(is_chain_stablecoin_compatible(Blockchain::Bitcoin, Asset::Usdt));
        assert!(!is_chain_stablecoin_compatible(Blockchain::Bitcoin, Asset::Usdc));
    }

    #[test]
    fn lightning_supports_usdt_and_usdc() {
        assert!(is_chain_stablecoin_compatible(Blockchain::Lightning, Asset::Usdt));
        assert!(is_chain_stablecoin_compatible(Blockchain::Lightning, Asset::Usdc));
        assert!(!is_chain_stablecoin_compatible(Blockchain::Lightning, Asset::Dai));
    }

    #[test]
    fn hash_round_trips_through_decompose() {
        for key in valid_catalog() {
            let decomposed = ProductKey::decompose(key.hash()).expect("decomposes");
            assert_eq!(decomposed.name(), key.name());
        }
    }

    #[test]
    fn hash_is_injective_over_valid_domain() {
        let catalog = valid_catalog();
        let mut hashes: Vec<u32> = catalog.iter().map(|k| k.hash()).collect();
        hashes.sort_unstable();
        let before = hashes.len();
        hashes.dedup();
        assert_eq!(before, hashes.len());
    }
}
