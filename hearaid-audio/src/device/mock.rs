//! Scripted device used by the engine and session tests

use super::{AudioDevice, DeviceEvent, FrameProcessor, SessionOptions, StreamFormat};
use crate::error::AudioError;
use crossbeam_channel::{unbounded, Receiver, Sender};

pub(crate) struct MockDevice {
    pub calls: Vec<&'static str>,
    pub format: StreamFormat,
    pub fail_configure: bool,
    pub fail_activate: bool,
    pub fail_start: bool,
    pub fail_resume: bool,
    pub options: Option<SessionOptions>,
    processor: Option<Box<dyn FrameProcessor>>,
    events: Option<Sender<DeviceEvent>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            format: StreamFormat::new(48000, 1),
            fail_configure: false,
            fail_activate: false,
            fail_start: false,
            fail_resume: false,
            options: None,
            processor: None,
            events: None,
        }
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    pub fn is_subscribed(&self) -> bool {
        self.events.is_some()
    }

    pub fn has_processor(&self) -> bool {
        self.processor.is_some()
    }

    pub fn emit(&self, event: DeviceEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Drive one callback through the installed processor, even when paused
    pub fn render(&mut self, input: &[f32]) -> Option<Vec<f32>> {
        let processor = self.processor.as_mut()?;
        let mut output = vec![0.0; input.len()];
        processor.process(input, &mut output);
        Some(output)
    }
}

impl AudioDevice for MockDevice {
    fn configure(&mut self, options: &SessionOptions) -> Result<(), AudioError> {
        self.calls.push("configure");
        if self.fail_configure {
            return Err(AudioError::device_config("no audio session"));
        }
        self.options = Some(*options);
        Ok(())
    }

    fn activate(&mut self) -> Result<(), AudioError> {
        self.calls.push("activate");
        if self.fail_activate {
            return Err(AudioError::device_config("activation refused"));
        }
        Ok(())
    }

    fn deactivate(&mut self) {
        self.calls.push("deactivate");
    }

    fn subscribe(&mut self) -> Receiver<DeviceEvent> {
        self.calls.push("subscribe");
        let (tx, rx) = unbounded();
        self.events = Some(tx);
        rx
    }

    fn unsubscribe(&mut self) {
        self.calls.push("unsubscribe");
        self.events = None;
    }

    fn stream_format(&self) -> Result<StreamFormat, AudioError> {
        Ok(self.format)
    }

    fn start(&mut self, processor: Box<dyn FrameProcessor>) -> Result<(), AudioError> {
        self.calls.push("start");
        if self.fail_start {
            return Err(AudioError::engine_start("input unavailable"));
        }
        self.processor = Some(processor);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.calls.push("pause");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.calls.push("resume");
        if self.fail_resume {
            return Err(AudioError::engine_start("resume refused"));
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.push("stop");
        self.processor = None;
    }
}
