use serde::{Deserialize, Serialize};
use std::fmt;

/// The 8 supported chains (§3), each carrying a stable integer id used in
/// on-chain payloads and product hashing (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Blockchain {
    Ethereum,
    Arbitrum,
    Base,
    Polygon,
    Bitcoin,
    Lightning,
    Ton,
    Solana,
}

impl Blockchain {
    pub const ALL: [Blockchain; 8] = [
        Blockchain::Ethereum,
        Blockchain::Arbitrum,
        Blockchain::Base,
        Blockchain::Polygon,
        Blockchain::Bitcoin,
        Blockchain::Lightning,
        Blockchain::Ton,
        Blockchain::Solana,
    ];

    pub fn id(self) -> u8 {
        match self {
            Blockchain::Ethereum => 0,
            Blockchain::Arbitrum => 1,
            Blockchain::Base => 2,
            Blockchain::Polygon => 3,
            Blockchain::Bitcoin => 4,
            Blockchain::Lightning => 5,
            Blockchain::Ton => 6,
            Blockchain::Solana => 7,
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Blockchain::Ethereum => "Ethereum",
            Blockchain::Arbitrum => "Arbitrum",
            Blockchain::Base => "Base",
            Blockchain::Polygon => "Polygon",
            Blockchain::Bitcoin => "Bitcoin",
            Blockchain::Lightning => "Lightning",
            Blockchain::Ton => "TON",
            Blockchain::Solana => "Solana",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Blockchain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Blockchain::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown chain: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_match_id_table() {
        assert_eq!(Blockchain::Ethereum.id(), 0);
        assert_eq!(Blockchain::Solana.id(), 7);
    }
}
