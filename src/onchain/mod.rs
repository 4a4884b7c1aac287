//! On-chain oracle write path (§6, component boundary for C8). Only the
//! message ABI is in scope (§1); submission goes through an injected
//! `Signer` and the contract itself is an external collaborator.

pub mod payload;
pub mod signer;

pub use payload::{encode_multiplier_payload, encode_swing_premium_payload, MULTIPLIER_OPCODE, SWING_PREMIUM_OPCODE};
pub use signer::{NoopSigner, Signer, TxReceipt};
