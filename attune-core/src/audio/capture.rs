//! Microphone capture via cpal.
//!
//! # Design constraints
//!
//! The cpal input callback runs on an OS audio thread at elevated
//! priority. It must not allocate, block on a lock, or perform I/O; it
//! only downmixes into a pre-grown scratch buffer and pushes into the
//! lock-free SPSC ring.
//!
//! # Threading note
//!
//! `cpal::Stream` is `!Send` on Windows/macOS, so `AudioCapture` must be
//! created and dropped on the same OS thread. Hosts typically open it on
//! the thread that also drains the ring.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat, SampleRate, Stream, StreamConfig,
};
use tracing::{error, info, warn};

use crate::buffering::{AudioProducer, Producer};
use crate::error::{AttuneError, Result};

/// Handle to an active input stream.
///
/// Dropping it stops capture and releases the device.
pub struct AudioCapture {
    /// Kept alive so the stream is not torn down prematurely.
    _stream: Stream,
    /// Actual capture sample rate reported by the device (Hz).
    pub sample_rate: u32,
}

impl AudioCapture {
    /// Open an input device by name, falling back to the default input
    /// device and then to the first device the host enumerates.
    pub fn open(
        mut producer: AudioProducer,
        running: Arc<AtomicBool>,
        preferred_device: Option<&str>,
    ) -> Result<Self> {
        let host = cpal::default_host();

        let mut selected = None;
        if let Some(name) = preferred_device {
            match host.input_devices() {
                Ok(mut devices) => {
                    selected =
                        devices.find(|d| d.name().map(|n| n == name).unwrap_or(false));
                    if selected.is_none() {
                        warn!("input device '{name}' not found, falling back");
                    }
                }
                Err(e) => warn!("failed to enumerate input devices: {e}"),
            }
        }

        let device = match selected.or_else(|| host.default_input_device()) {
            Some(device) => device,
            None => {
                let mut devices = host
                    .input_devices()
                    .map_err(|e| AttuneError::AudioDevice(e.to_string()))?;
                devices.next().ok_or(AttuneError::NoDefaultInputDevice)?
            }
        };

        info!(
            device = device.name().unwrap_or_default().as_str(),
            "opening input device"
        );

        let supported = device
            .default_input_config()
            .map_err(|e| AttuneError::AudioDevice(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;

        let config = StreamConfig {
            channels: channels as u16,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let running = Arc::clone(&running);
                let mut mix = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _info| {
                        if !running.load(Ordering::Relaxed) {
                            return;
                        }
                        push_mono(&mut producer, &mut mix, data, channels, |s| s);
                    },
                    |err| error!("audio stream error: {err}"),
                    None,
                )
            }
            SampleFormat::I16 => {
                let running = Arc::clone(&running);
                let mut mix = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _info| {
                        if !running.load(Ordering::Relaxed) {
                            return;
                        }
                        push_mono(&mut producer, &mut mix, data, channels, |s| {
                            f32::from(s) / 32_768.0
                        });
                    },
                    |err| error!("audio stream error: {err}"),
                    None,
                )
            }
            fmt => {
                return Err(AttuneError::AudioStream(format!(
                    "unsupported sample format: {fmt:?}"
                )))
            }
        }
        .map_err(|e| AttuneError::AudioStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AttuneError::AudioStream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }
}

/// Downmix interleaved input to mono and push it into the ring.
///
/// `mix` is a reusable scratch buffer; `resize` only allocates on the
/// first callback for a given buffer size.
fn push_mono<T: Copy>(
    producer: &mut AudioProducer,
    mix: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    to_f32: impl Fn(T) -> f32,
) {
    let frames = data.len() / channels.max(1);
    mix.resize(frames, 0.0);
    if channels <= 1 {
        for (dst, src) in mix.iter_mut().zip(data.iter()) {
            *dst = to_f32(*src);
        }
    } else {
        for (f, dst) in mix.iter_mut().enumerate() {
            let base = f * channels;
            let sum: f32 = data[base..base + channels].iter().map(|s| to_f32(*s)).sum();
            *dst = sum / channels as f32;
        }
    }

    let written = producer.push_slice(mix);
    if written < mix.len() {
        warn!("ring buffer full: dropped {} samples", mix.len() - written);
    }
}
