//! Big-endian oracle write payloads (§6). Two op-codes share a 7-byte id
//! prefix (op-code + product triple); the multiplier payload is fixed at
//! 14 bytes, the swing-premium variant is longer and its exact field
//! order is an Open Question (§9) resolved here by following the §6 prose
//! literally — the binding contract ABI remains authoritative on-chain.

use alloy_sol_types::{sol, SolCall};

pub const MULTIPLIER_OPCODE: u32 = 0x756d_6c74; // "umlt"
pub const SWING_PREMIUM_OPCODE: u32 = 0x7377_6e67; // "swng"

sol! {
    interface IOracleWriter {
        function publishMultiplier(bytes calldata payload) external;
        function publishSwingPremium(bytes calldata payload) external;
    }
}

/// Wraps a raw §6 payload into calldata for the oracle contract's write
/// entry point. The contract itself is an external collaborator (§1); this
/// only fixes the function selector the signer submits against.
pub fn multiplier_calldata(payload: &[u8]) -> Vec<u8> {
    IOracleWriter::publishMultiplierCall { payload: payload.to_vec().into() }.abi_encode()
}

pub fn swing_premium_calldata(payload: &[u8]) -> Vec<u8> {
    IOracleWriter::publishSwingPremiumCall { payload: payload.to_vec().into() }.abi_encode()
}

fn id_prefix(opcode: u32, coverage_type_id: u8, chain_id: u8, stablecoin_id: u8) -> [u8; 7] {
    let op = opcode.to_be_bytes();
    [op[0], op[1], op[2], op[3], coverage_type_id, chain_id, stablecoin_id]
}

/// 14-byte classic multiplier update payload (§6).
pub fn encode_multiplier_payload(
    coverage_type_id: u8,
    chain_id: u8,
    stablecoin_id: u8,
    base_multiplier_bps: u16,
    market_adjustment_bps: i16,
    volatility_premium_bps: i16,
) -> [u8; 14] {
    let mut buf = [0u8; 14];
    buf[0..7].copy_from_slice(&id_prefix(MULTIPLIER_OPCODE, coverage_type_id, chain_id, stablecoin_id));
    // byte 7 reserved, already zero
    buf[8..10].copy_from_slice(&base_multiplier_bps.to_be_bytes());
    buf[10..12].copy_from_slice(&market_adjustment_bps.to_be_bytes());
    buf[12..14].copy_from_slice(&volatility_premium_bps.to_be_bytes());
    buf
}

/// Swing-premium payload variant (§6): the 7-byte id prefix followed by
/// `base_premium_bps: i32`, `hedge_cost_bps: i32`, `risk_multiplier_bps:
/// u16`, `total_premium_bps: i32`, `timestamp: u64` (29 bytes total).
pub fn encode_swing_premium_payload(
    coverage_type_id: u8,
    chain_id: u8,
    stablecoin_id: u8,
    base_premium_bps: i32,
    hedge_cost_bps: i32,
    risk_multiplier_bps: u16,
    total_premium_bps: i32,
    timestamp_unix_secs: u64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(29);
    buf.extend_from_slice(&id_prefix(SWING_PREMIUM_OPCODE, coverage_type_id, chain_id, stablecoin_id));
    buf.extend_from_slice(&base_premium_bps.to_be_bytes());
    buf.extend_from_slice(&hedge_cost_bps.to_be_bytes());
    buf.extend_from_slice(&risk_multiplier_bps.to_be_bytes());
    buf.extend_from_slice(&total_premium_bps.to_be_bytes());
    buf.extend_from_slice(&timestamp_unix_secs.to_be_bytes());
    buf
}
