// SPDX-License-Identifier: GPL-3.0-only
//! V4L2 webcam capture
//!
//! Format negotiation happens on the caller's thread so failures surface
//! from [`CaptureSource::open`]. Buffers are memory-mapped and dequeued on a
//! [`CaptureLoop`] thread, converted to RGBA, and handed over through a
//! bounded channel. When the pipeline falls behind, frames are dropped.

use super::format_converters::CapturePixelFormat;
use super::frame_loop::CaptureLoop;
use super::{CaptureConstraints, CaptureSource, StreamInfo};
use crate::constants::capture::{
    BUFFER_COUNT, CHANNEL_CAPACITY, FRAME_LOG_INTERVAL, RETRY_DELAY, START_TIMEOUT,
};
use crate::errors::{VelvetError, VelvetResult};
use crate::frame::Frame;
use crate::scheduler::LoopAction;
use futures::channel::mpsc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// A video capture node found on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
}

/// List V4L2 device nodes
pub fn enumerate_devices() -> Vec<DeviceEntry> {
    let devices: Vec<DeviceEntry> = v4l::context::enum_devices()
        .into_iter()
        .map(|node| DeviceEntry {
            index: node.index(),
            name: node.name().unwrap_or_else(|| "Unknown".to_string()),
            path: node.path().to_path_buf(),
        })
        .collect();
    debug!(count = devices.len(), "Enumerated V4L2 devices");
    devices
}

/// Webcam source backed by a V4L2 device node
pub struct V4l2Source {
    path: PathBuf,
    capture: Option<CaptureLoop>,
    frames: Option<mpsc::Receiver<Frame>>,
    info: Option<StreamInfo>,
}

impl V4l2Source {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            capture: None,
            frames: None,
            info: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Ask for YUYV at the requested size and accept whatever convertible format
/// the driver settles on
fn negotiate(
    dev: &Device,
    constraints: &CaptureConstraints,
) -> VelvetResult<(CapturePixelFormat, v4l::Format)> {
    let mut format = dev
        .format()
        .map_err(|e| VelvetError::DeviceAcquisition(format!("Failed to query format: {}", e)))?;
    format.width = constraints.width;
    format.height = constraints.height;
    format.fourcc = FourCC::new(b"YUYV");

    let actual = dev
        .set_format(&format)
        .map_err(|e| VelvetError::DeviceAcquisition(format!("Failed to set format: {}", e)))?;

    let fourcc = actual
        .fourcc
        .str()
        .map(str::to_string)
        .unwrap_or_else(|_| format!("{:?}", actual.fourcc));
    info!(
        width = actual.width,
        height = actual.height,
        fourcc = %fourcc,
        "Negotiated V4L2 format"
    );

    let pixel_format = CapturePixelFormat::from_fourcc(&fourcc).ok_or_else(|| {
        VelvetError::UnrecognizedMediaStream(format!("unsupported pixel format {}", fourcc))
    })?;
    Ok((pixel_format, actual))
}

impl CaptureSource for V4l2Source {
    fn describe(&self) -> String {
        format!("V4L2 {}", self.path.display())
    }

    fn open(&mut self, constraints: &CaptureConstraints) -> VelvetResult<StreamInfo> {
        if self.is_open() {
            self.stop();
        }

        info!(
            device = %self.path.display(),
            width = constraints.width,
            height = constraints.height,
            "Opening V4L2 device"
        );

        let dev = Device::with_path(&self.path).map_err(|e| {
            VelvetError::DeviceAcquisition(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        let (pixel_format, format) = negotiate(&dev, constraints)?;
        let (width, height, stride) = (format.width, format.height, format.stride);

        let (mut sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<(), String>>(1);
        let mut frame_count: u64 = 0;

        let capture = CaptureLoop::start_with_init(
            "v4l2-capture",
            move || match MmapStream::with_buffers(&dev, Type::VideoCapture, BUFFER_COUNT) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    Ok(stream)
                }
                Err(e) => {
                    let message = format!("Failed to create buffer stream: {}", e);
                    let _ = ready_tx.send(Err(message.clone()));
                    Err(message)
                }
            },
            move |stream| {
                let (buf, meta) = match stream.next() {
                    Ok(next) => next,
                    Err(e) => {
                        warn!(error = %e, "Failed to dequeue frame");
                        std::thread::sleep(RETRY_DELAY);
                        return LoopAction::Continue;
                    }
                };

                let used = (meta.bytesused as usize).min(buf.len());
                let frame = match pixel_format.to_frame(&buf[..used], width, height, stride) {
                    Ok(frame) => frame,
                    Err(e) => {
                        debug!(error = %e, "Dropping undecodable frame");
                        return LoopAction::Continue;
                    }
                };

                frame_count += 1;
                match sender.try_send(frame) {
                    Ok(()) => {
                        if frame_count % FRAME_LOG_INTERVAL == 0 {
                            debug!(
                                frame = frame_count,
                                sequence = meta.sequence,
                                size = used,
                                "Frame captured"
                            );
                        }
                        LoopAction::Continue
                    }
                    Err(e) if e.is_disconnected() => {
                        debug!("Frame receiver dropped");
                        LoopAction::Stop
                    }
                    Err(_) => LoopAction::Continue,
                }
            },
        );

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => {}
            Ok(Err(message)) => return Err(VelvetError::DeviceAcquisition(message)),
            Err(_) => {
                drop(capture);
                return Err(VelvetError::DeviceAcquisition(format!(
                    "{} did not start streaming",
                    self.path.display()
                )));
            }
        }

        let info = StreamInfo {
            width,
            height,
            pixel_format: pixel_format.fourcc().to_string(),
        };
        info!(device = %self.path.display(), stream = %info, "V4L2 stream started");

        self.capture = Some(capture);
        self.frames = Some(receiver);
        self.info = Some(info.clone());
        Ok(info)
    }

    fn next_frame(&mut self) -> VelvetResult<Option<Frame>> {
        let Some(receiver) = self.frames.as_mut() else {
            return Ok(None);
        };

        // Only the newest frame matters
        let mut latest = None;
        while let Ok(frame) = receiver.try_recv() {
            latest = Some(frame);
        }

        if latest.is_none() && !self.capture.as_ref().is_some_and(CaptureLoop::is_running) {
            return Err(VelvetError::DeviceAcquisition(format!(
                "{} stopped delivering frames",
                self.path.display()
            )));
        }
        Ok(latest)
    }

    fn stop(&mut self) {
        // Dropping the receiver first lets a thread blocked on a full channel exit
        self.frames = None;
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
            info!(device = %self.path.display(), "V4L2 stream stopped");
        }
        self.info = None;
    }

    fn is_open(&self) -> bool {
        self.capture.is_some()
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        self.stop();
    }
}
