//! cpal-backed device: default input and output joined by a lock-free ring

use super::{
    AudioDevice, DeviceEvent, FrameProcessor, RouteChangeReason, SessionOptions, StreamFormat,
};
use crate::config::DEFAULT_RING_LATENCY_MS;
use crate::error::AudioError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, BuildStreamError, Device, FromSample, Host, Sample, SampleFormat, SampleRate,
    SizedSample, Stream, StreamConfig, StreamError,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scratch size for the output callback (grows if a host asks for more)
const MAX_CALLBACK_SAMPLES: usize = 8192;

type EventSlot = Arc<Mutex<Option<Sender<DeviceEvent>>>>;

/// Open capture + output pair
struct StreamPair {
    input: Stream,
    output: Stream,
}

/// Device names the running graph is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
struct BoundRoute {
    input: String,
    output: String,
}

/// Default-device backend on the platform's default cpal host
///
/// The session options have no direct equivalent on desktop hosts; they are
/// recorded and logged. Route changes come from two sources: streams
/// reporting `DeviceNotAvailable`, and [`AudioDevice::refresh_route`]
/// noticing that a bound device left the host's device list.
pub struct CpalDevice {
    host: Host,
    options: Option<SessionOptions>,
    active: bool,
    ring_latency_ms: u32,
    streams: Option<StreamPair>,
    events: EventSlot,
    /// Set once a lost device was reported for the current streams
    loss_reported: Arc<AtomicBool>,
    bound: Option<BoundRoute>,
    last_default_output: Option<String>,
}

impl Default for CpalDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalDevice {
    pub fn new() -> Self {
        Self::with_latency(DEFAULT_RING_LATENCY_MS)
    }

    /// Create a device with a custom capture -> output buffer depth
    pub fn with_latency(ring_latency_ms: u32) -> Self {
        Self {
            host: cpal::default_host(),
            options: None,
            active: false,
            ring_latency_ms: ring_latency_ms.max(1),
            streams: None,
            events: Arc::new(Mutex::new(None)),
            loss_reported: Arc::new(AtomicBool::new(false)),
            bound: None,
            last_default_output: None,
        }
    }

    /// Name of the host backend (ALSA, CoreAudio, WASAPI, ...)
    pub fn host_name(&self) -> &'static str {
        self.host.id().name()
    }

    fn default_devices(&self) -> Result<(Device, Device), AudioError> {
        let input = self
            .host
            .default_input_device()
            .ok_or_else(|| AudioError::engine_start("no audio input device found"))?;
        let output = self
            .host
            .default_output_device()
            .ok_or_else(|| AudioError::engine_start("no audio output device found"))?;
        Ok((input, output))
    }

    fn emit(&self, event: DeviceEvent) {
        if let Some(tx) = self.events.lock().as_ref() {
            let _ = tx.send(event);
        }
    }

    fn device_names<I>(devices: Result<I, cpal::DevicesError>) -> Vec<String>
    where
        I: Iterator<Item = Device>,
    {
        match devices {
            Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
            Err(e) => {
                warn!("Failed to enumerate audio devices: {}", e);
                Vec::new()
            }
        }
    }
}

/// Error callback shared by both streams
fn stream_error_handler(
    events: EventSlot,
    loss_reported: Arc<AtomicBool>,
    direction: &'static str,
) -> impl FnMut(StreamError) + Send + 'static {
    move |err| match err {
        StreamError::DeviceNotAvailable => {
            // Input and output usually fail together; report the loss once
            if !loss_reported.swap(true, Ordering::AcqRel) {
                warn!("Audio {} device became unavailable", direction);
                if let Some(tx) = events.lock().as_ref() {
                    let _ = tx.send(DeviceEvent::RouteChange {
                        reason: RouteChangeReason::OldDeviceUnavailable,
                    });
                }
            }
        }
        other => warn!("Audio {} stream error: {}", direction, other),
    }
}

/// Convert captured samples to f32 and queue them; returns how many fit
fn push_captured<T>(producer: &mut HeapProd<f32>, data: &[T]) -> usize
where
    T: SizedSample,
    f32: FromSample<T>,
{
    producer.push_iter(data.iter().map(|s| f32::from_sample(*s)))
}

fn write_converted<T>(output: &mut [T], processed: &[f32])
where
    T: SizedSample + FromSample<f32>,
{
    for (out, sample) in output.iter_mut().zip(processed) {
        *out = sample.to_sample::<T>();
    }
}

/// Capture stream pushing `T` samples into the ring as f32
fn build_capture<T, E>(
    device: &Device,
    config: &StreamConfig,
    mut producer: HeapProd<f32>,
    on_error: E,
) -> Result<Stream, BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
    E: FnMut(StreamError) + Send + 'static,
{
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            // Overflow drops the newest capture; the output side catches up
            push_captured(&mut producer, data);
        },
        on_error,
        None,
    )
}

/// Output stream running `processor` on f32 and writing `T` samples
fn build_playback<T, E>(
    device: &Device,
    config: &StreamConfig,
    mut consumer: HeapCons<f32>,
    mut processor: Box<dyn FrameProcessor>,
    on_error: E,
) -> Result<Stream, BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
    E: FnMut(StreamError) + Send + 'static,
{
    let mut captured = vec![0.0f32; MAX_CALLBACK_SAMPLES];
    let mut processed = vec![0.0f32; MAX_CALLBACK_SAMPLES];
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            // Should rarely happen after the first callback
            if data.len() > captured.len() {
                captured.resize(data.len(), 0.0);
                processed.resize(data.len(), 0.0);
            }
            let input = &mut captured[..data.len()];
            let output = &mut processed[..data.len()];
            let read = consumer.pop_slice(input);
            input[read..].fill(0.0);
            processor.process(input, output);
            write_converted(data, output);
        },
        on_error,
        None,
    )
}

fn unsupported_format(direction: &str, format: SampleFormat) -> AudioError {
    AudioError::engine_start(format!("unsupported {} sample format {}", direction, format))
}

impl AudioDevice for CpalDevice {
    fn configure(&mut self, options: &SessionOptions) -> Result<(), AudioError> {
        if self.host.default_input_device().is_none() {
            return Err(AudioError::device_config("no audio input device found"));
        }
        if self.host.default_output_device().is_none() {
            return Err(AudioError::device_config("no audio output device found"));
        }

        debug!(
            host = self.host_name(),
            prefer_speaker_output = options.prefer_speaker_output,
            mix_with_others = options.mix_with_others,
            allow_wireless_input = options.allow_wireless_input,
            "Configuring audio session (options are advisory on this host)"
        );
        self.options = Some(*options);
        Ok(())
    }

    fn activate(&mut self) -> Result<(), AudioError> {
        if self.options.is_none() {
            return Err(AudioError::device_config("session is not configured"));
        }

        let (input, output) = self
            .default_devices()
            .map_err(|e| AudioError::device_config(e.to_string()))?;
        input
            .default_input_config()
            .map_err(|e| AudioError::device_config(format!("input config: {}", e)))?;
        output
            .default_output_config()
            .map_err(|e| AudioError::device_config(format!("output config: {}", e)))?;

        self.last_default_output = output.name().ok();
        self.active = true;
        info!("Audio session active on {}", self.host_name());
        Ok(())
    }

    fn deactivate(&mut self) {
        self.stop();
        self.active = false;
    }

    fn subscribe(&mut self) -> Receiver<DeviceEvent> {
        let (tx, rx) = unbounded();
        *self.events.lock() = Some(tx);
        rx
    }

    fn unsubscribe(&mut self) {
        *self.events.lock() = None;
    }

    fn stream_format(&self) -> Result<StreamFormat, AudioError> {
        if !self.active {
            return Err(AudioError::engine_start("audio session is not active"));
        }
        let (input, _) = self.default_devices()?;
        let config = input
            .default_input_config()
            .map_err(|e| AudioError::engine_start(format!("input unavailable: {}", e)))?;
        Ok(StreamFormat::new(config.sample_rate().0, config.channels()))
    }

    fn start(&mut self, processor: Box<dyn FrameProcessor>) -> Result<(), AudioError> {
        self.stop();

        let format = self.stream_format()?;
        let (input_device, output_device) = self.default_devices()?;
        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let input_format = input_device
            .default_input_config()
            .map_err(|e| AudioError::engine_start(format!("input unavailable: {}", e)))?
            .sample_format();
        let output_format = output_device
            .default_output_config()
            .map_err(|e| AudioError::engine_start(format!("output unavailable: {}", e)))?
            .sample_format();

        let capacity = (format.sample_rate as usize
            * format.channels as usize
            * self.ring_latency_ms as usize
            / 1000)
            .max(format.channels as usize * 1024);
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();

        self.loss_reported.store(false, Ordering::Release);

        let on_input_error =
            stream_error_handler(self.events.clone(), self.loss_reported.clone(), "input");
        let input = match input_format {
            SampleFormat::F32 => build_capture::<f32, _>(&input_device, &config, producer, on_input_error),
            SampleFormat::I16 => build_capture::<i16, _>(&input_device, &config, producer, on_input_error),
            SampleFormat::U16 => build_capture::<u16, _>(&input_device, &config, producer, on_input_error),
            other => return Err(unsupported_format("input", other)),
        }
        .map_err(|e| AudioError::engine_start(format!("input stream: {}", e)))?;

        let on_output_error =
            stream_error_handler(self.events.clone(), self.loss_reported.clone(), "output");
        let output = match output_format {
            SampleFormat::F32 => {
                build_playback::<f32, _>(&output_device, &config, consumer, processor, on_output_error)
            }
            SampleFormat::I16 => {
                build_playback::<i16, _>(&output_device, &config, consumer, processor, on_output_error)
            }
            SampleFormat::U16 => {
                build_playback::<u16, _>(&output_device, &config, consumer, processor, on_output_error)
            }
            other => return Err(unsupported_format("output", other)),
        }
        .map_err(|e| AudioError::engine_start(format!("output stream: {}", e)))?;

        input
            .play()
            .map_err(|e| AudioError::engine_start(format!("failed to start capture: {}", e)))?;
        output
            .play()
            .map_err(|e| AudioError::engine_start(format!("failed to start output: {}", e)))?;

        let route = BoundRoute {
            input: input_device.name().unwrap_or_default(),
            output: output_device.name().unwrap_or_default(),
        };
        info!(
            input = %route.input,
            output = %route.output,
            sample_rate = format.sample_rate,
            channels = format.channels,
            input_format = %input_format,
            output_format = %output_format,
            "Audio streams running"
        );
        self.last_default_output = Some(route.output.clone());
        self.bound = Some(route);
        self.streams = Some(StreamPair { input, output });
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        if let Some(streams) = &self.streams {
            streams
                .input
                .pause()
                .map_err(|e| AudioError::engine_start(format!("failed to pause capture: {}", e)))?;
            streams
                .output
                .pause()
                .map_err(|e| AudioError::engine_start(format!("failed to pause output: {}", e)))?;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let streams = self
            .streams
            .as_ref()
            .ok_or_else(|| AudioError::engine_start("no open streams to resume"))?;
        streams
            .input
            .play()
            .map_err(|e| AudioError::engine_start(format!("failed to resume capture: {}", e)))?;
        streams
            .output
            .play()
            .map_err(|e| AudioError::engine_start(format!("failed to resume output: {}", e)))?;
        Ok(())
    }

    fn stop(&mut self) {
        if self.streams.take().is_some() {
            debug!("Audio streams closed");
        }
        self.bound = None;
    }

    fn refresh_route(&mut self) {
        if !self.active {
            return;
        }

        if let Some(bound) = &self.bound {
            let inputs = Self::device_names(self.host.input_devices());
            let outputs = Self::device_names(self.host.output_devices());
            let lost = !inputs.contains(&bound.input) || !outputs.contains(&bound.output);
            if lost && !self.loss_reported.swap(true, Ordering::AcqRel) {
                warn!(input = %bound.input, output = %bound.output, "Bound audio device disappeared");
                self.bound = None;
                self.emit(DeviceEvent::RouteChange {
                    reason: RouteChangeReason::OldDeviceUnavailable,
                });
                return;
            }
        }

        let current = self.host.default_output_device().and_then(|d| d.name().ok());
        if current.is_some() && current != self.last_default_output {
            debug!(output = ?current, "Default output device changed");
            self.last_default_output = current;
            self.emit(DeviceEvent::RouteChange {
                reason: RouteChangeReason::Other,
            });
        }
    }
}
