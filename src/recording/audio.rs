//! Audio capture and metering.
//!
//! This module handles audio input device management and PCM sample capture.
//! Audio is captured from the system's default (or a configured) input device,
//! converted to mono, and reduced to normalized metering levels that feed the
//! waveform visualization. The captured take can optionally be saved as a
//! 16-bit mono WAV file.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Captures audio from a specified or default input device.
///
/// Features:
/// - Captures from a specified input device or system default at its native sample rate
/// - Converts multi-channel audio to mono by averaging channels
/// - Derives normalized 0.0-1.0 metering levels from the most recent samples
/// - Pause and resume support
pub struct AudioCapture {
    /// Actual capture sample rate from device
    sample_rate: u32,
    /// Captured audio samples (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active audio input stream (kept alive during capture)
    stream: Option<cpal::Stream>,
    /// Whether capture is currently paused
    is_paused: Arc<Mutex<bool>>,
    /// Device name or "default" to use the system default device
    device_name: String,
    /// Reference level in dBFS mapped to a full-scale bar
    reference_level_db: i8,
}

impl AudioCapture {
    /// Creates a new capture with requested sample rate and device.
    ///
    /// Note: The actual sample rate may differ based on device capabilities.
    /// Call `sample_rate()` after `start()` to get the actual rate.
    pub fn new(requested_sample_rate: u32, device_name: String, reference_level_db: i8) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            is_paused: Arc::new(Mutex::new(false)),
            device_name,
            reference_level_db,
        }
    }

    /// Starts capturing from the configured input device.
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If device configuration fails
    /// - If audio stream creation fails
    pub fn start(&mut self) -> Result<()> {
        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Capturing at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            num_channels
        );

        self.sample_rate = device_sample_rate;

        let samples_arc = Arc::clone(&self.samples);
        let pause_arc = Arc::clone(&self.is_paused);
        let callback_channels = num_channels;

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let is_paused = *pause_arc.lock().unwrap();
                if !is_paused {
                    Self::handle_audio_callback(data, &samples_arc, callback_channels);
                }
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    /// Stops the capture stream. Captured samples stay available.
    pub fn stop(&mut self) {
        self.stream = None;

        let sample_count = self.samples.lock().unwrap().len();
        let duration_secs = sample_count as f32 / self.sample_rate as f32;
        tracing::info!(
            "Capture stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            sample_count,
            self.sample_rate
        );
    }

    /// Handles incoming audio data from the audio callback.
    ///
    /// Converts multi-channel audio to mono by averaging all channels.
    fn handle_audio_callback(
        data: &[i16],
        samples_arc: &Arc<Mutex<Vec<i16>>>,
        num_channels: usize,
    ) {
        let mut samples = samples_arc.lock().unwrap();

        match num_channels {
            1 => {
                samples.extend_from_slice(data);
            }
            2 => {
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    let mono = ((left + right) / 2) as i16;
                    samples.push(mono);
                }
            }
            _ => {
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    let mono = (sum / num_channels as i32) as i16;
                    samples.push(mono);
                }
            }
        }
    }

    /// Current metering level, normalized to 0.0-1.0.
    ///
    /// Computes the RMS of the most recent 50 ms window of samples, converts
    /// it to dBFS, and maps a 40 dB window below the configured reference
    /// level onto the 0.0-1.0 bar scale.
    pub fn level(&self) -> f32 {
        let samples = self.samples.lock().unwrap();
        level_from_samples(&samples, self.sample_rate, self.reference_level_db)
    }

    /// Saves the captured take as a 16-bit mono WAV file.
    ///
    /// # Errors
    /// - If no samples were captured
    /// - If the WAV file cannot be written
    pub fn save_wav(&self, path: &Path) -> Result<()> {
        let samples = self.samples.lock().unwrap();

        if samples.is_empty() {
            return Err(anyhow!("No samples captured, nothing to save"));
        }

        let wav_spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, wav_spec)?;
        for &sample in samples.iter() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        tracing::info!(
            "Recording saved: {} ({} samples)",
            path.display(),
            samples.len()
        );
        Ok(())
    }

    /// Returns the number of captured samples.
    pub fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    /// Returns the actual sample rate of the capture.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns whether capture is currently paused.
    pub fn is_paused(&self) -> bool {
        *self.is_paused.lock().unwrap()
    }

    /// Toggles between paused and capturing states.
    pub fn toggle_pause(&self) {
        let mut paused = self.is_paused.lock().unwrap();
        *paused = !*paused;
        if *paused {
            tracing::debug!("Capture paused");
        } else {
            tracing::debug!("Capture resumed");
        }
    }
}

/// Derives one normalized metering level from the tail of a sample buffer.
///
/// RMS over the last `sample_rate / 20` samples (50 ms), mapped from dBFS
/// onto 0.0-1.0 using a 40 dB window ending at `reference_level_db`.
pub fn level_from_samples(samples: &[i16], sample_rate: u32, reference_level_db: i8) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let window = std::cmp::min(sample_rate / 20, samples.len() as u32) as usize;
    let recent_samples = &samples[samples.len() - window..];

    let sum_of_squares: i64 = recent_samples.iter().map(|&x| (x as i64).pow(2)).sum();
    let mean_square = sum_of_squares / recent_samples.len() as i64;
    let rms = (mean_square as f32).sqrt();

    let db_fs = if rms > 0.0 {
        20.0 * (rms / 32767.0).log10()
    } else {
        -160.0
    };

    let min_db = reference_level_db as f32 - 40.0;
    ((db_fs - min_db) / 40.0).clamp(0.0, 1.0)
}

/// Finds an audio input device by name or numeric index.
///
/// # Arguments
/// * `host` - The cpal audio host
/// * `device_spec` - Either "default" for system default, a device name, or a numeric index (0, 1, 2, etc.)
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    // Try to parse as a numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        } else {
            return Err(anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            ));
        }
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'wavebar list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
