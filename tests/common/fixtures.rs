//! Test fixtures: raw files and a wired-up pipeline

#![allow(dead_code)]

use crate::common::RecordingPreviewProvider;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use receipt_intake::ingest::{FileIngestor, IngestLimits};
use receipt_intake::preview::ResourceReclaimer;
use receipt_intake::store::SubmissionStore;
use receipt_intake::types::{RawFile, SubmissionId};
use std::io::Cursor;
use std::sync::Arc;

pub const MIB: usize = 1024 * 1024;

/// JPEG input of `size` bytes
pub fn jpeg(name: &str, size: usize) -> RawFile {
    RawFile::new(name, "image/jpeg", vec![0xFFu8; size])
}

/// PNG input of `size` bytes
pub fn png(name: &str, size: usize) -> RawFile {
    RawFile::new(name, "image/png", vec![0x89u8; size])
}

/// PDF input of `size` bytes
pub fn pdf(name: &str, size: usize) -> RawFile {
    RawFile::new(name, "application/pdf", vec![0x25u8; size])
}

/// Decodable PNG, `width` x `height`, with a red top-left pixel on black
pub fn real_png(name: &str, width: u32, height: u32) -> RawFile {
    let mut pixels = RgbImage::new(width, height);
    pixels.put_pixel(0, 0, Rgb([255, 0, 0]));
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(pixels)
        .write_to(&mut encoded, ImageFormat::Png)
        .unwrap();
    RawFile::new(name, "image/png", encoded.into_inner())
}

/// Ingestor and store sharing one reclaimer over a recording provider
pub struct Pipeline {
    pub ingestor: FileIngestor,
    pub store: SubmissionStore,
    pub reclaimer: Arc<ResourceReclaimer>,
    pub provider: Arc<RecordingPreviewProvider>,
}

impl Pipeline {
    pub fn new() -> Self {
        let provider = Arc::new(RecordingPreviewProvider::new());
        let reclaimer = Arc::new(ResourceReclaimer::new(provider.clone()));
        Self {
            ingestor: FileIngestor::new(IngestLimits::default(), reclaimer.clone()),
            store: SubmissionStore::new(reclaimer.clone()),
            reclaimer,
            provider,
        }
    }

    /// Ingest files, add the accepted ones to the store, return their ids
    pub fn load(&self, files: Vec<RawFile>) -> Vec<SubmissionId> {
        let report = self.ingestor.ingest(files);
        let ids = report.accepted.iter().map(|s| s.id).collect();
        self.store.add(report.accepted).unwrap();
        ids
    }
}
