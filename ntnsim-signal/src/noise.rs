//! Receiver noise floor and the elevation-dependent interference model.

/// Boltzmann constant (J/K)
pub const BOLTZMANN_J_PER_K: f64 = 1.380_649e-23;

/// IEEE reference temperature for noise figure (K)
pub const REFERENCE_TEMPERATURE_K: f64 = 290.0;

/// Interference-to-noise ratio at the horizon (dB).
pub const HORIZON_INR_DB: f64 = 6.0;

/// Interference-to-noise ratio at zenith (dB).
pub const ZENITH_INR_DB: f64 = -10.0;

/// System noise temperature (K): antenna temperature plus receiver contribution.
pub fn system_noise_temperature_k(antenna_temperature_k: f64, noise_figure_db: f64) -> f64 {
    let factor = 10f64.powf(noise_figure_db / 10.0);
    antenna_temperature_k + REFERENCE_TEMPERATURE_K * (factor - 1.0)
}

/// Thermal noise power `k·T·B` in dBm.
pub fn thermal_noise_dbm(system_temperature_k: f64, bandwidth_hz: f64) -> f64 {
    10.0 * (BOLTZMANN_J_PER_K * system_temperature_k * bandwidth_hz).log10() + 30.0
}

/// Interference-to-noise ratio (dB) at `elevation_deg`.
///
/// Falls linearly in `sin(elevation)` from the horizon value to the zenith
/// value: low passes see more multipath and adjacent-beam interference.
pub fn interference_to_noise_db(elevation_deg: f64) -> f64 {
    let s = elevation_deg.clamp(0.0, 90.0).to_radians().sin();
    HORIZON_INR_DB - (HORIZON_INR_DB - ZENITH_INR_DB) * s
}

/// Power sum of dBm terms, in dBm.
pub fn power_sum_dbm(terms: &[f64]) -> f64 {
    10.0 * terms.iter().map(|p| 10f64.powf(p / 10.0)).sum::<f64>().log10()
}
