use crate::curves::CurveKind;
use serde::{Deserialize, Serialize};

/// One of the six capital tranches (§3). Immutable config created at
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrancheId {
    SureBtc,
    SureSnr,
    SureMezz,
    SureJnr,
    SureJnrPlus,
    SureEqt,
}

impl TrancheId {
    pub const ALL: [TrancheId; 6] = [
        TrancheId::SureBtc,
        TrancheId::SureSnr,
        TrancheId::SureMezz,
        TrancheId::SureJnr,
        TrancheId::SureJnrPlus,
        TrancheId::SureEqt,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TrancheId::SureBtc => "SURE_BTC",
            TrancheId::SureSnr => "SURE_SNR",
            TrancheId::SureMezz => "SURE_MEZZ",
            TrancheId::SureJnr => "SURE_JNR",
            TrancheId::SureJnrPlus => "SURE_JNR+",
            TrancheId::SureEqt => "SURE_EQT",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrancheConfig {
    pub id: TrancheId,
    pub apy_min: f64,
    pub apy_max: f64,
    pub allocation_percent: f64,
    pub curve: CurveKind,
}

/// Default tranche configuration (§3): flat/log/linear/sigmoidal/quadratic/
/// exponential curves in increasing order of risk, allocations summing to
/// 100%.
pub fn default_tranches() -> Vec<TrancheConfig> {
    vec![
        TrancheConfig {
            id: TrancheId::SureBtc,
            apy_min: 4.0,
            apy_max: 4.0,
            allocation_percent: 20.0,
            curve: CurveKind::Flat,
        },
        TrancheConfig {
            id: TrancheId::SureSnr,
            apy_min: 5.0,
            apy_max: 8.0,
            allocation_percent: 25.0,
            curve: CurveKind::Logarithmic,
        },
        TrancheConfig {
            id: TrancheId::SureMezz,
            apy_min: 9.0,
            apy_max: 15.0,
            allocation_percent: 25.0,
            curve: CurveKind::Linear,
        },
        TrancheConfig {
            id: TrancheId::SureJnr,
            apy_min: 12.0,
            apy_max: 22.0,
            allocation_percent: 15.0,
            curve: CurveKind::Sigmoidal,
        },
        TrancheConfig {
            id: TrancheId::SureJnrPlus,
            apy_min: 15.0,
            apy_max: 35.0,
            allocation_percent: 10.0,
            curve: CurveKind::Quadratic,
        },
        TrancheConfig {
            id: TrancheId::SureEqt,
            apy_min: 20.0,
            apy_max: 60.0,
            allocation_percent: 5.0,
            curve: CurveKind::Exponential,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allocations_sum_to_100() {
        let total: f64 = default_tranches().iter().map(|t| t.allocation_percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
