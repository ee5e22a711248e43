// ── wweb Atoms Layer ───────────────────────────────────────────────────────
// Pure constants, payload types and the error enum. No I/O, no side effects.
// Dependency rule: atoms may only depend on std and external pure crates.
// Nothing here may import from engine/ or lib.rs.

pub mod constants;
pub mod error;
pub mod types;
