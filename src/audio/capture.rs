//! Real audio capture using CPAL (Cross-Platform Audio Library).
//!
//! The device callback runs on CPAL's own audio thread and does exactly one
//! thing: convert the incoming batch to normalized mono f32 and append it to
//! a shared buffer. Everything else (framing, scoring, transcription)
//! happens downstream on the pipeline's threads.

use crate::audio::source::FrameSource;
use crate::defaults;
use crate::error::{Result, VoxgateError};
use crate::sys::with_suppressed_stderr;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Suppress noisy JACK/ALSA messages that occur during audio backend probing.
///
/// Call once at startup, before spawning threads.
pub fn suppress_audio_warnings() {
    crate::sys::set_env("JACK_NO_START_SERVER", "1");
    crate::sys::set_env("JACK_NO_AUDIO_RESERVATION", "1");
    crate::sys::set_env("PIPEWIRE_DEBUG", "0");
    crate::sys::set_env("ALSA_DEBUG", "0");
    crate::sys::set_env("PW_LOG", "0");
}

/// Preferred device names for GNOME/PipeWire environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns to filter out (not useful for voice input).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List available audio input devices, filtered and with preferred ones
/// marked `[recommended]`.
///
/// # Errors
/// Returns `VoxgateError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| VoxgateError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }
            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Get the best default input device, preferring PipeWire/PulseAudio so the
/// desktop's device selection is respected.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name()
                    && is_preferred_device(&name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| VoxgateError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only touched while holding the Mutex in
/// `CpalFrameSource`, so access is serialized across threads.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone frame source backed by CPAL.
///
/// Captures mono f32 at the pipeline rate. Tries the preferred format first
/// (f32/16kHz/mono), then i16 with conversion, then the device's native
/// config with software channel mixing and resampling.
pub struct CpalFrameSource {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    buffer: Arc<Mutex<Vec<f32>>>,
    callback_count: Arc<AtomicU64>,
    sample_rate: u32,
}

impl CpalFrameSource {
    /// Create a CPAL frame source.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name; `None` picks the best default.
    ///
    /// # Errors
    /// Returns `AudioDeviceNotFound` when the named device does not exist,
    /// or `AudioCapture` when enumeration fails.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host
                    .input_devices()
                    .map_err(|e| VoxgateError::AudioCapture {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                for dev in devices {
                    if let Ok(dev_name) = dev.name()
                        && dev_name == name
                    {
                        return Ok(dev);
                    }
                }

                Err(VoxgateError::AudioDeviceNotFound {
                    device: name.to_string(),
                })
            } else {
                get_best_default_device()
            }
        })?;

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            callback_count: Arc::new(AtomicU64::new(0)),
            sample_rate: defaults::SAMPLE_RATE,
        })
    }

    /// Build the audio stream with the configured format.
    ///
    /// Tries in order:
    /// 1. f32/16kHz/mono — preferred, zero-conversion path
    /// 2. i16/16kHz/mono — for devices that only expose integer formats
    /// 3. Device default config — native rate/channels with software conversion
    ///
    /// Step 3 handles PipeWire setups where the ALSA compatibility layer
    /// accepts non-native configs but never fires the data callback.
    fn build_stream(&self) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        // f32/16kHz/mono — PipeWire/PulseAudio convert transparently
        let buffer = Arc::clone(&self.buffer);
        let counter = Arc::clone(&self.callback_count);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                counter.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend(data.iter().map(|&s| s.clamp(-1.0, 1.0)));
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // i16/16kHz/mono — for devices that only expose integer formats
        let buffer = Arc::clone(&self.buffer);
        let counter = Arc::clone(&self.callback_count);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                counter.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend(data.iter().map(|&s| s as f32 / 32768.0));
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        self.build_stream_native()
    }

    /// Build a stream using the device's default/native config, with software
    /// channel mixing (stereo→mono) and resampling (native rate→16kHz).
    fn build_stream_native(&self) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| VoxgateError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate().0;
        let native_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate;

        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "voxgate: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            default_config.sample_format(),
        );

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        let buffer = Arc::clone(&self.buffer);
        let counter = Arc::clone(&self.callback_count);

        match default_config.sample_format() {
            SampleFormat::F32 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let converted =
                            convert_to_mono_target_rate(data, native_channels, native_rate, target_rate);
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| VoxgateError::AudioCapture {
                    message: format!("Failed to build native f32 stream: {}", e),
                }),
            SampleFormat::I16 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let f32_data: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        let converted = convert_to_mono_target_rate(
                            &f32_data,
                            native_channels,
                            native_rate,
                            target_rate,
                        );
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| VoxgateError::AudioCapture {
                    message: format!("Failed to build native i16 stream: {}", e),
                }),
            fmt => Err(VoxgateError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. \
                     Try specifying a device with --device.",
                    fmt
                ),
            }),
        }
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono_target_rate(
    samples: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let mono: Vec<f32> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if source_rate == target_rate {
        mono
    } else {
        crate::audio::wav::resample(&mono, source_rate, target_rate)
    }
}

impl FrameSource for CpalFrameSource {
    fn start(&mut self) -> Result<()> {
        {
            let stream_guard = self.stream.lock().map_err(|e| VoxgateError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if stream_guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| VoxgateError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        // Wait briefly to check if the CPAL callback actually fires.
        // Some PipeWire-ALSA setups accept non-native configs but never deliver data.
        std::thread::sleep(std::time::Duration::from_millis(200));

        let final_stream = if self.callback_count.load(Ordering::Relaxed) == 0 {
            // Preferred config didn't deliver data — stop it, clear buffer, try native
            drop(stream);
            if let Ok(mut buf) = self.buffer.lock() {
                buf.clear();
            }

            let native_stream = self.build_stream_native()?;
            native_stream
                .play()
                .map_err(|e| VoxgateError::AudioCapture {
                    message: format!("Failed to start native audio stream: {}", e),
                })?;
            native_stream
        } else {
            stream
        };

        let mut stream_guard = self.stream.lock().map_err(|e| VoxgateError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *stream_guard = Some(SendableStream(final_stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| VoxgateError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        if let Some(sendable_stream) = stream_guard.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| VoxgateError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        let mut buffer = self.buffer.lock().map_err(|e| VoxgateError::AudioCapture {
            message: format!("Failed to lock audio buffer: {}", e),
        })?;

        Ok(std::mem::take(&mut *buffer))
    }

    fn is_finite(&self) -> bool {
        false
    }
}
