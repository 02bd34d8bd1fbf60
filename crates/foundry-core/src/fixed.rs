use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// All simulated durations, timers and conveyor progress use this type so
/// that two runs fed the same inputs agree bit for bit.
pub type Fixed64 = I32F32;

/// Ticks count calls to `Simulation::step`.
pub type Ticks = u64;

/// `numerator / denominator` clamped to `[0, 1]`. Zero when the denominator is not positive.
pub fn unit_fraction(numerator: Fixed64, denominator: Fixed64) -> Fixed64 {
    if denominator <= Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    numerator
        .checked_div(denominator)
        .unwrap_or(Fixed64::ONE)
        .clamp(Fixed64::ZERO, Fixed64::ONE)
}
