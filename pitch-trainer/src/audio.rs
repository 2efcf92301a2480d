//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input device and configuration, downmixes to mono, and
//! streams fixed-size frames to the analysis loop over a bounded channel.
//!
//! ## Features
//! - Automatic audio device selection
//! - Configurable sample rate and frame size
//! - Mono downmix of multi-channel inputs
//! - Frames are dropped, not queued, when analysis falls behind

use anyhow::{Context, Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use tracing::{error, info, warn};

/// Default number of samples per analysis frame (~46ms at 44.1kHz).
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Default requested capture rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Accumulates interleaved input into fixed-size mono frames.
#[derive(Debug)]
pub struct FrameAssembler {
    channels: usize,
    frame_size: usize,
    pending: Vec<f32>,
}

impl FrameAssembler {
    pub fn new(channels: usize, frame_size: usize) -> Self {
        Self {
            channels: channels.max(1),
            frame_size,
            pending: Vec::with_capacity(frame_size * 2),
        }
    }

    /// Appends interleaved samples and returns every frame completed by them.
    pub fn push(&mut self, data: &[f32]) -> Vec<Vec<f32>> {
        if self.channels == 1 {
            self.pending.extend_from_slice(data);
        } else {
            let scale = 1.0 / self.channels as f32;
            self.pending.extend(
                data.chunks_exact(self.channels)
                    .map(|frame| frame.iter().sum::<f32>() * scale),
            );
        }

        let mut frames = Vec::new();
        while self.frame_size > 0 && self.pending.len() >= self.frame_size {
            frames.push(self.pending.drain(..self.frame_size).collect());
        }
        frames
    }
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks an f32 configuration close to the requested sample rate
/// 3. Sets up a callback that sends mono frames to the analysis loop
///
/// # Arguments
/// * `sender` - Bounded channel sender for frames of `frame_size` samples
/// * `sample_rate` - Requested sample rate in Hz
/// * `frame_size` - Samples per frame
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and actual sample rate
/// * `Err(e)` - Error if audio setup fails
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    sample_rate: u32,
    frame_size: usize,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!(target: "audio", "Using audio input device: {}", device.name()?);

    let configs = device
        .supported_input_configs()
        .context("querying input configurations")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, sample_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = sample_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    if rate != sample_rate {
        warn!(target: "audio", "{} Hz not supported, using {} Hz", sample_rate, rate);
    }
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));

    let sample_rate_val = config.sample_rate().0;
    let channels = config.channels() as usize;
    let config: cpal::StreamConfig = config.into();

    info!(
        target: "audio",
        "Selected {} Hz, {} channel(s), {} samples per frame",
        sample_rate_val, channels, frame_size
    );

    let err_fn = |err| error!(target: "audio", "An error occurred on the audio stream: {}", err);

    let mut assembler = FrameAssembler::new(channels, frame_size);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            for frame in assembler.push(data) {
                // Drop the frame if the analysis side is behind.
                let _ = sender.try_send(frame);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only 32-bit float formats are considered. Ranges containing the target
/// rate win, then mono over multi-channel, then the closest range edge.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let distance = if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            };
            (distance, c.channels() != 1, c.channels())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_mono_frames() {
        let mut assembler = FrameAssembler::new(1, 4);
        assert!(assembler.push(&[0.1, 0.2, 0.3]).is_empty());
        let frames = assembler.push(&[0.4, 0.5, 0.6, 0.7, 0.8, 0.9]);
        assert_eq!(frames, vec![vec![0.1, 0.2, 0.3, 0.4], vec![0.5, 0.6, 0.7, 0.8]]);
        assert_eq!(assembler.push(&[1.0, 1.1, 1.2]).len(), 1);
    }

    #[test]
    fn downmixes_interleaved_stereo() {
        let mut assembler = FrameAssembler::new(2, 2);
        let frames = assembler.push(&[1.0, 0.0, 0.5, 0.5]);
        assert_eq!(frames, vec![vec![0.5, 0.5]]);
    }
}
