//! Free-space propagation: path loss, delay and Doppler.

use std::f64::consts::PI;

/// Speed of light in m/s
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Free-space path loss (dB), Friis: `20·log10(4π·d·f / c)`.
///
/// # Arguments
/// * `distance_km` - Slant range (km)
/// * `frequency_hz` - Carrier frequency (Hz)
pub fn fspl_db(distance_km: f64, frequency_hz: f64) -> f64 {
    let distance_m = distance_km * 1000.0;
    20.0 * (4.0 * PI * distance_m * frequency_hz / SPEED_OF_LIGHT_M_S).log10()
}

/// One-way propagation delay in milliseconds
pub fn propagation_delay_ms(distance_km: f64) -> f64 {
    distance_km * 1000.0 / SPEED_OF_LIGHT_M_S * 1000.0
}

/// Doppler shift (Hz) seen by the ground terminal.
///
/// `relative_velocity_ms` is the range rate, positive when the satellite
/// recedes, so a receding satellite yields a negative shift.
pub fn doppler_shift_hz(relative_velocity_ms: f64, frequency_hz: f64) -> f64 {
    -(relative_velocity_ms / SPEED_OF_LIGHT_M_S) * frequency_hz
}
