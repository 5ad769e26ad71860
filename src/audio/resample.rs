//! Sample-rate conversion from the device's native rate to the pipeline rate.
//!
//! Microphones rarely run at the 16 kHz the segmentation pipeline expects, so
//! captured chunks pass through here before byte assembly. The high-quality
//! path uses a sinc resampler; without it a linear resampler with an FIR
//! anti-aliasing pre-filter takes over.

use anyhow::{anyhow, Result};
#[cfg(feature = "high-quality-audio")]
use rubato::{InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction};
use std::cmp::Ordering as CmpOrdering;
use std::f32::consts::PI;
#[cfg(feature = "high-quality-audio")]
use std::sync::atomic::{AtomicBool, Ordering};

pub(super) const MIN_DEVICE_RATE: u32 = 2_000;
pub(super) const MAX_DEVICE_RATE: u32 = 1_600_000;
pub(super) const MIN_RESAMPLE_RATIO: f64 = 0.01;
pub(super) const MAX_RESAMPLE_RATIO: f64 = 8.0;
const MAX_DOWNSAMPLING_TAPS: usize = 129;

#[cfg(feature = "high-quality-audio")]
static RESAMPLER_WARNING_SHOWN: AtomicBool = AtomicBool::new(false);

pub(super) fn resample_to_rate(input: &[f32], device_rate: u32, target_rate: u32) -> Vec<f32> {
    if device_rate == 0 || target_rate == 0 {
        return input.to_vec();
    }
    if input.is_empty() || device_rate == target_rate {
        return input.to_vec();
    }

    #[cfg(feature = "high-quality-audio")]
    {
        match resample_with_rubato(input, device_rate, target_rate) {
            Ok(output) => output,
            Err(err) => {
                if !RESAMPLER_WARNING_SHOWN.swap(true, Ordering::AcqRel) {
                    tracing::warn!(
                        error = %err,
                        "high-quality resampler failed, falling back to basic path"
                    );
                }
                basic_resample(input, device_rate, target_rate)
            }
        }
    }

    #[cfg(not(feature = "high-quality-audio"))]
    {
        basic_resample(input, device_rate, target_rate)
    }
}

#[cfg(feature = "high-quality-audio")]
pub(super) fn resample_with_rubato(
    input: &[f32],
    device_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>> {
    if input.is_empty() || device_rate == target_rate {
        return Ok(input.to_vec());
    }
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return Err(anyhow!(
            "unsupported device sample rate {device_rate}Hz for resampling"
        ));
    }
    let ratio = f64::from(target_rate) / f64::from(device_rate);
    if !(MIN_RESAMPLE_RATIO..=MAX_RESAMPLE_RATIO).contains(&ratio) {
        return Err(anyhow!("invalid resample ratio {ratio}"));
    }

    let chunk = 256usize;
    let params = InterpolationParameters {
        sinc_len: 64,
        f_cutoff: 0.90,
        interpolation: InterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk, 1)
        .map_err(|e| anyhow!("failed to construct sinc resampler: {e:?}"))?;

    // Fixed-input resamplers want whole blocks, so the last partial block is
    // padded with its own tail value and the output trimmed back afterwards.
    let cap = ((input.len() as f64) * MAX_RESAMPLE_RATIO).ceil() as usize;
    let expected = (((input.len() as f64) * ratio).round() as usize)
        .clamp(1, cap)
        .saturating_add(8);
    let mut resampled = Vec::with_capacity(expected);

    let mut block = vec![0.0f32; chunk];
    for segment in input.chunks(chunk) {
        block[..segment.len()].copy_from_slice(segment);
        if segment.len() < chunk {
            let pad = segment.last().copied().unwrap_or(0.0);
            block[segment.len()..].fill(pad);
        }
        let produced = resampler
            .process(std::slice::from_ref(&block), None)
            .map_err(|e| anyhow!("resampler process failed: {e:?}"))?;
        resampled.extend_from_slice(&produced[0]);
    }

    match resampled.len().cmp(&expected) {
        CmpOrdering::Greater => resampled.truncate(expected),
        CmpOrdering::Less => {
            let pad = resampled.last().copied().unwrap_or(0.0);
            resampled.resize(expected, pad);
        }
        CmpOrdering::Equal => {}
    }
    Ok(resampled)
}

pub(super) fn basic_resample(input: &[f32], device_rate: u32, target_rate: u32) -> Vec<f32> {
    if input.is_empty() || !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return input.to_vec();
    }

    let mut ratio = target_rate as f32 / device_rate as f32;
    ratio = ratio.clamp(MIN_RESAMPLE_RATIO as f32, MAX_RESAMPLE_RATIO as f32);
    let filtered = if device_rate > target_rate {
        // Decimation needs a low-pass first or high frequencies alias.
        let taps = downsampling_tap_count(device_rate, target_rate);
        low_pass_fir(input, device_rate, target_rate, taps)
    } else {
        input.to_vec()
    };
    resample_linear(&filtered, ratio)
}

/// Lightweight linear resampler used after optional filtering; fine for short
/// speech chunks where latency matters more than phase accuracy.
pub(super) fn resample_linear(input: &[f32], ratio: f32) -> Vec<f32> {
    let output_len = (input.len() as f32 * ratio).round() as usize;
    let tail = input.last().copied().unwrap_or(0.0);

    (0..output_len)
        .map(|i| {
            let position = i as f32 / ratio;
            let idx = position.floor() as usize;
            match input.get(idx..idx + 2) {
                Some(pair) => {
                    let frac = position - idx as f32;
                    pair[0] * (1.0 - frac) + pair[1] * frac
                }
                None => tail,
            }
        })
        .collect()
}

/// Tap count scaled to the decimation ratio, kept odd and bounded so the FIR
/// stays cheap at near-equal rates.
pub(super) fn downsampling_tap_count(device_rate: u32, target_rate: u32) -> usize {
    let decimation_ratio = device_rate as f32 / target_rate.max(1) as f32;
    let mut taps = (decimation_ratio * 4.0).ceil().max(11.0) as usize;
    if taps % 2 == 0 {
        taps += 1;
    }
    taps.min(MAX_DOWNSAMPLING_TAPS)
}

/// Hamming-windowed sinc low-pass applied before decimation.
pub(super) fn low_pass_fir(
    input: &[f32],
    device_rate: u32,
    target_rate: u32,
    taps: usize,
) -> Vec<f32> {
    if input.is_empty() || taps <= 1 {
        return input.to_vec();
    }

    let normalized_cutoff = (target_rate as f32 * 0.5 / device_rate as f32).min(0.499);
    let coeffs = design_low_pass(normalized_cutoff, taps);
    let half = (taps / 2) as isize;
    let len = input.len() as isize;
    let mut output = Vec::with_capacity(input.len());

    // Taps that fall off either edge of the signal contribute nothing.
    for n in 0..len {
        let mut acc = 0.0;
        for (k, coeff) in coeffs.iter().enumerate() {
            let idx = n + k as isize - half;
            if (0..len).contains(&idx) {
                acc += input[idx as usize] * coeff;
            }
        }
        output.push(acc);
    }

    output
}

/// Hamming-windowed sinc taps, normalized to unit DC gain.
pub(super) fn design_low_pass(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    let m = (taps - 1) as f32;
    let mut coeffs: Vec<f32> = (0..taps)
        .map(|n| {
            let centered = n as f32 - m / 2.0;
            let sinc = if centered == 0.0 {
                2.0 * normalized_cutoff
            } else {
                let x = 2.0 * PI * normalized_cutoff * centered;
                (2.0 * normalized_cutoff * x.sin()) / x
            };
            let window = if taps <= 1 {
                1.0
            } else {
                0.54 - 0.46 * ((2.0 * PI * n as f32) / m).cos()
            };
            sinc * window
        })
        .collect();

    let gain: f32 = coeffs.iter().sum();
    if gain != 0.0 {
        for coeff in &mut coeffs {
            *coeff /= gain;
        }
    }

    coeffs
}
