//! Signal-quality derivation for ground-to-satellite links
//!
//! Turns one geometric sample (slant range, elevation, range rate) into the
//! three standard link-quality metrics per 3GPP TR 38.811/38.821:
//!
//! - **RSRP**: EIRP minus free-space and gaseous losses
//! - **SINR**: received carrier over thermal noise plus elevation-dependent interference
//! - **RSRQ**: carrier over total received power
//!
//! The engine is a pure function of its inputs and is safe to call from any
//! number of threads.
//!
//! # Reference
//! - ITU-R P.525: Calculation of free-space attenuation
//! - ITU-R P.676: Attenuation by atmospheric gases
//! - 3GPP TR 38.811: Study on NR to support non-terrestrial networks

pub mod atmosphere;
pub mod engine;
pub mod noise;
pub mod propagation;

pub use atmosphere::{slant_path_attenuation_db, GaseousAttenuation, ReferenceAtmosphere};
pub use engine::{compute, GeometryFault, LinkBudget, QualityAssessment, SignalQualityEngine};
pub use noise::{interference_to_noise_db, system_noise_temperature_k, thermal_noise_dbm};
pub use propagation::{doppler_shift_hz, fspl_db, propagation_delay_ms, SPEED_OF_LIGHT_M_S};
