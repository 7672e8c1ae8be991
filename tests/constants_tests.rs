// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use std::time::Duration;
use velvet::constants::{self, capture, file_formats, processors, timing};
use velvet::{PipelineContext, VelvetError};

#[test]
fn test_builtin_names_are_registered() {
    let ctx = PipelineContext::new();
    assert!(ctx.registry().contains(processors::GRAYSCALE));
    assert!(ctx.registry().contains(processors::MODULUS));
    for name in processors::DEFAULT_ACTIVE {
        assert!(ctx.registry().contains(name), "{} should be built in", name);
    }
}

#[test]
fn test_overflow_message_mentions_max() {
    let message = VelvetError::Overflow {
        max: constants::PROCESSOR_MAX_COUNT,
    }
    .to_string();
    assert_eq!(
        message,
        "Overflow Exception: Cannot add more than 10 processors for now."
    );
}

#[test]
fn test_disabled_message() {
    assert_eq!(VelvetError::Disabled.to_string(), constants::DISABLED_MESSAGE);
}

#[test]
fn test_refresh_interval() {
    assert_eq!(timing::refresh_interval(50), Duration::from_millis(20));
    // A zero rate is treated as 1 Hz
    assert_eq!(timing::refresh_interval(0), Duration::from_secs(1));
}

#[test]
fn test_capture_defaults() {
    assert_eq!((capture::DEFAULT_WIDTH, capture::DEFAULT_HEIGHT), (1280, 720));
    assert!(capture::BUFFER_COUNT >= 2);
    assert!(capture::RETRY_DELAY < capture::START_TIMEOUT);
    assert_eq!(capture::START_TIMEOUT, Duration::from_secs(5));
}

#[test]
fn test_snapshot_extension_is_supported_image() {
    assert!(file_formats::is_image_extension(file_formats::SNAPSHOT_EXTENSION));
}

#[test]
fn test_version_is_set() {
    assert!(!constants::app_info::version().is_empty());
}
