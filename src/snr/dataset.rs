//! Deterministic synthetic observations per named dataset.
//!
//! A dataset is a frames × channels flux matrix mimicking a transit
//! time series at a given SNR:
//!
//! - unit continuum
//! - a rank-1 smooth systematic (airmass-like trend × per-channel response)
//! - a planetary absorption signal injected into the in-transit frames only,
//!   Doppler-shifted per frame so it is not itself a rank-1 structure that
//!   detrending could remove
//! - Gaussian noise with sigma = 1/SNR
//!
//! The RNG seed mixes the configured base seed with the dataset name, so the
//! same name always yields the same observations while distinct SNR levels
//! stay independent.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ObsParams, SnrLevel, Target};
use crate::error::AppError;

/// Relative depth of the injected absorption signal.
const SIGNAL_DEPTH: f64 = 0.02;

/// Amplitude of the airmass-like systematic trend.
const SYSTEMATIC_AMP: f64 = 0.05;

/// Absorption line centers, as fractions of the channel range.
const LINE_CENTERS: [f64; 5] = [0.18, 0.33, 0.52, 0.71, 0.86];

/// Absorption line width in channels.
const LINE_SIGMA: f64 = 2.0;

/// Largest planet Doppler shift in channels (at the first/last frame).
const MAX_SHIFT: i64 = 10;

/// One synthesized dataset, ready for detrending and cross-correlation.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub snr: u32,
    /// frames × channels flux matrix.
    pub flux: DMatrix<f64>,
    /// Per-frame transit mask (true = in transit).
    pub in_transit: Vec<bool>,
    /// Rest-frame absorption template (per channel, positive = deeper line).
    pub template: DVector<f64>,
}

/// Synthesize the observations for one SNR level of a target.
pub fn synthesize(target: &Target, level: &SnrLevel, params: &ObsParams) -> Result<Dataset, AppError> {
    if params.frames < 12 {
        return Err(AppError::config("At least 12 frames are required."));
    }
    if params.channels < 16 {
        return Err(AppError::config("At least 16 channels are required."));
    }
    if level.snr == 0 {
        return Err(AppError::config("SNR must be positive."));
    }

    let frames = params.frames;
    let channels = params.channels;

    let mut rng = StdRng::seed_from_u64(dataset_seed(params.seed, &level.dataset));
    let sigma = 1.0 / level.snr as f64;
    let noise = Normal::new(0.0, sigma)
        .map_err(|e| AppError::compute(format!("Noise distribution error: {e}")))?;

    let template = absorption_template(channels);
    let in_transit = transit_mask(frames);

    // Rank-1 systematic: parabolic airmass trend across frames times a smooth
    // per-channel response.
    let trend: Vec<f64> = (0..frames)
        .map(|f| {
            let phase = f as f64 / (frames as f64 - 1.0);
            SYSTEMATIC_AMP * (4.0 * (phase - 0.5).powi(2))
        })
        .collect();
    let response: Vec<f64> = (0..channels)
        .map(|ch| {
            let u = ch as f64 / (channels as f64 - 1.0);
            (std::f64::consts::TAU * 1.5 * u + 0.7).sin()
        })
        .collect();

    let mut flux = DMatrix::<f64>::zeros(frames, channels);
    for f in 0..frames {
        let shifted = if in_transit[f] {
            Some(shifted_template(&template, planet_shift(frames, f)))
        } else {
            None
        };
        for ch in 0..channels {
            let mut v = 1.0 + trend[f] * response[ch];
            if let Some(t) = &shifted {
                v -= SIGNAL_DEPTH * t[ch];
            }
            v += noise.sample(&mut rng);
            flux[(f, ch)] = v;
        }
    }

    let _ = target; // dataset names already encode the target

    Ok(Dataset {
        name: level.dataset.clone(),
        snr: level.snr,
        flux,
        in_transit,
        template,
    })
}

/// Planet Doppler shift of frame `f`, in channels.
///
/// Linear in orbital phase, sweeping from `-MAX_SHIFT` to `+MAX_SHIFT` over
/// the full time series. Defined at every frame, not just in transit, so the
/// cross-correlation can shift out-of-transit frames to the same rest frame.
pub fn planet_shift(frames: usize, f: usize) -> i64 {
    let phase = f as f64 / (frames as f64 - 1.0);
    (MAX_SHIFT as f64 * (2.0 * phase - 1.0)).round() as i64
}

/// Shift a template by an integer channel offset, zero-padding the edges.
pub fn shifted_template(template: &DVector<f64>, shift: i64) -> DVector<f64> {
    let n = template.len() as i64;
    DVector::from_fn(template.len(), |ch, _| {
        let src = ch as i64 - shift;
        if (0..n).contains(&src) {
            template[src as usize]
        } else {
            0.0
        }
    })
}

/// Mix the base seed with the dataset name.
fn dataset_seed(base: u64, dataset: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    dataset.hash(&mut hasher);
    hasher.finish()
}

/// Gaussian absorption lines at fixed channel positions, unit peak depth.
fn absorption_template(channels: usize) -> DVector<f64> {
    let mut t = DVector::<f64>::zeros(channels);
    for ch in 0..channels {
        let mut v: f64 = 0.0;
        for &center in &LINE_CENTERS {
            let c = center * (channels as f64 - 1.0);
            let z = (ch as f64 - c) / LINE_SIGMA;
            v += (-0.5 * z * z).exp();
        }
        t[ch] = v.min(1.0);
    }
    t
}

/// Transit covers the middle third of the frames.
fn transit_mask(frames: usize) -> Vec<bool> {
    let start = frames / 3;
    let end = 2 * frames / 3;
    (0..frames).map(|f| f >= start && f < end).collect()
}
