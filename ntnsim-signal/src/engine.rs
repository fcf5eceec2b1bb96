//! Signal-quality engine: geometric sample + link parameters -> quality record.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use ntnsim_common::config::LinkParameters;
use ntnsim_common::types::{LinkSample, SignalQuality};

use crate::atmosphere::{GaseousAttenuation, ReferenceAtmosphere};
use crate::noise::{
    interference_to_noise_db, power_sum_dbm, system_noise_temperature_k, thermal_noise_dbm,
};
use crate::propagation::{doppler_shift_hz, fspl_db, propagation_delay_ms};

/// Why a sample could not be turned into a usable quality record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryFault {
    /// The sample carries no distance
    MissingDistance,
    /// The sample carries no elevation
    MissingElevation,
    /// Distance is zero, negative or not a number
    NonPhysicalDistance,
    /// Elevation is at or below the horizon, above zenith, or not a number
    NonPhysicalElevation,
}

impl GeometryFault {
    /// True if the fault is an absent field rather than a bad value.
    pub fn is_missing_field(&self) -> bool {
        matches!(self, GeometryFault::MissingDistance | GeometryFault::MissingElevation)
    }
}

/// Intermediate terms of a successful derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkBudget {
    /// Free-space path loss (dB)
    pub fspl_db: f64,
    /// Oxygen and dry-air loss along the slant path (dB)
    pub oxygen_loss_db: f64,
    /// Water-vapour loss along the slant path (dB)
    pub water_vapour_loss_db: f64,
    /// Total gaseous loss (dB)
    pub atmospheric_loss_db: f64,
    /// Thermal noise floor over the channel bandwidth (dBm)
    pub noise_floor_dbm: f64,
    /// Interference power (dBm)
    pub interference_dbm: f64,
    /// Doppler shift (Hz), present when the sample carries a range rate
    pub doppler_shift_hz: Option<f64>,
    /// One-way propagation delay (ms)
    pub propagation_delay_ms: f64,
}

/// Result of one derivation.
///
/// When the geometry is non-physical the quality is the floor record and
/// must not be consumed as a measurement; branch on [`is_valid`](Self::is_valid)
/// or use [`usable`](Self::usable).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    quality: SignalQuality,
    budget: Option<LinkBudget>,
    fault: Option<GeometryFault>,
}

impl QualityAssessment {
    fn valid(quality: SignalQuality, budget: LinkBudget) -> Self {
        Self {
            quality,
            budget: Some(budget),
            fault: None,
        }
    }

    fn invalid(sample: &LinkSample, fault: GeometryFault) -> Self {
        Self {
            quality: SignalQuality::floor(sample.timestamp),
            budget: None,
            fault: Some(fault),
        }
    }

    /// False if the input geometry was non-physical or incomplete.
    pub fn is_valid(&self) -> bool {
        self.fault.is_none()
    }

    /// The quality record, including the floor value for invalid input.
    pub fn quality(&self) -> &SignalQuality {
        &self.quality
    }

    /// The quality record only if it describes a real measurement.
    pub fn usable(&self) -> Option<&SignalQuality> {
        self.is_valid().then_some(&self.quality)
    }

    /// Loss terms of a valid derivation.
    pub fn budget(&self) -> Option<&LinkBudget> {
        self.budget.as_ref()
    }

    /// The reason the derivation was rejected, if it was.
    pub fn fault(&self) -> Option<GeometryFault> {
        self.fault
    }
}

/// Pure signal-quality engine.
///
/// Frequency-only terms (specific attenuation, noise floor) are evaluated
/// once at construction; `compute` never fails and never mutates.
#[derive(Debug, Clone)]
pub struct SignalQualityEngine {
    params: LinkParameters,
    gaseous: GaseousAttenuation,
    noise_floor_dbm: f64,
}

impl SignalQualityEngine {
    /// Creates an engine for the mean annual reference atmosphere.
    pub fn new(params: LinkParameters) -> Self {
        Self::with_atmosphere(params, ReferenceAtmosphere::mean_annual_global())
    }

    /// Creates an engine for a specific atmospheric state.
    pub fn with_atmosphere(params: LinkParameters, atmosphere: ReferenceAtmosphere) -> Self {
        let gaseous = GaseousAttenuation::at(params.frequency_hz, &atmosphere);
        let t_sys =
            system_noise_temperature_k(params.antenna_temperature_k, params.receiver_noise_figure_db);
        let noise_floor_dbm = thermal_noise_dbm(t_sys, params.bandwidth_hz);
        Self {
            params,
            gaseous,
            noise_floor_dbm,
        }
    }

    /// Link parameters in use
    pub fn params(&self) -> &LinkParameters {
        &self.params
    }

    /// Thermal noise floor over the configured bandwidth (dBm)
    pub fn noise_floor_dbm(&self) -> f64 {
        self.noise_floor_dbm
    }

    /// Derives the quality record for one sample.
    pub fn compute(&self, sample: &LinkSample) -> QualityAssessment {
        let (distance_km, elevation_deg) = match check_geometry(sample) {
            Ok(geometry) => geometry,
            Err(fault) => return QualityAssessment::invalid(sample, fault),
        };
        let p = &self.params;

        let fspl = fspl_db(distance_km, p.frequency_hz);
        let (oxygen, water) = self.gaseous.slant_path_db(elevation_deg);
        let atmospheric = oxygen + water;

        let rsrp_dbm = p.tx_power_dbm + p.tx_antenna_gain_dbi - fspl - atmospheric;

        let interference_dbm = self.noise_floor_dbm + interference_to_noise_db(elevation_deg);
        let carrier_dbm = rsrp_dbm + p.rx_antenna_gain_dbi;
        let impairment_dbm = power_sum_dbm(&[self.noise_floor_dbm, interference_dbm]);
        let sinr_db = carrier_dbm - impairment_dbm;
        let rsrq_db = carrier_dbm - power_sum_dbm(&[carrier_dbm, impairment_dbm]);

        let budget = LinkBudget {
            fspl_db: fspl,
            oxygen_loss_db: oxygen,
            water_vapour_loss_db: water,
            atmospheric_loss_db: atmospheric,
            noise_floor_dbm: self.noise_floor_dbm,
            interference_dbm,
            doppler_shift_hz: sample
                .relative_velocity_ms
                .filter(|v| v.is_finite())
                .map(|v| doppler_shift_hz(v, p.frequency_hz)),
            propagation_delay_ms: propagation_delay_ms(distance_km),
        };

        QualityAssessment::valid(
            SignalQuality::new(rsrp_dbm, rsrq_db, sinr_db, sample.timestamp),
            budget,
        )
    }

    /// Derives quality records for many samples on the rayon pool.
    ///
    /// Output order matches input order.
    pub fn compute_batch(&self, samples: &[LinkSample]) -> Vec<QualityAssessment> {
        samples.par_iter().map(|s| self.compute(s)).collect()
    }
}

/// One-shot derivation without keeping an engine around.
pub fn compute(sample: &LinkSample, params: &LinkParameters) -> QualityAssessment {
    SignalQualityEngine::new(params.clone()).compute(sample)
}

fn check_geometry(sample: &LinkSample) -> Result<(f64, f64), GeometryFault> {
    let distance = sample.distance_km.ok_or(GeometryFault::MissingDistance)?;
    let elevation = sample.elevation_deg.ok_or(GeometryFault::MissingElevation)?;
    if !distance.is_finite() || distance <= 0.0 {
        return Err(GeometryFault::NonPhysicalDistance);
    }
    if !elevation.is_finite() || elevation <= 0.0 || elevation > 90.0 {
        return Err(GeometryFault::NonPhysicalElevation);
    }
    Ok((distance, elevation))
}
