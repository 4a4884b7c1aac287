use serde::{Deserialize, Serialize};
use std::fmt;

/// The 5 coverage types (§3), each carrying a stable integer id (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageType {
    Depeg,
    SmartContract,
    Oracle,
    Bridge,
    CexLiquidation,
}

impl CoverageType {
    pub const ALL: [CoverageType; 5] = [
        CoverageType::Depeg,
        CoverageType::SmartContract,
        CoverageType::Oracle,
        CoverageType::Bridge,
        CoverageType::CexLiquidation,
    ];

    pub fn id(self) -> u8 {
        match self {
            CoverageType::Depeg => 0,
            CoverageType::SmartContract => 1,
            CoverageType::Oracle => 2,
            CoverageType::Bridge => 3,
            CoverageType::CexLiquidation => 4,
        }
    }
}

impl fmt::Display for CoverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CoverageType::Depeg => "Depeg",
            CoverageType::SmartContract => "SmartContract",
            CoverageType::Oracle => "Oracle",
            CoverageType::Bridge => "Bridge",
            CoverageType::CexLiquidation => "CexLiquidation",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for CoverageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoverageType::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown coverage type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_ids_match_id_table() {
        assert_eq!(CoverageType::Depeg.id(), 0);
        assert_eq!(CoverageType::CexLiquidation.id(), 4);
    }
}
