use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, trace, warn};

use crate::config::ScanConfig;
use crate::error::Rejection;
use crate::formats::header::DbHeader;
use crate::signatures::SignatureRegistry;
use crate::types::{FormatDescriptor, Offset, ProbeMode, Variant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarvedFile {
    pub offset: Offset,
    pub length: u64,
    pub variant: Variant,
    pub extension: &'static str,
    pub calculated_file_size: Option<u64>,
    pub header: Option<DbHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl CarvedFile {
    fn from_descriptor(offset: Offset, length: u64, desc: FormatDescriptor) -> Option<Self> {
        Some(Self {
            offset,
            length,
            variant: desc.variant?,
            extension: desc.extension,
            calculated_file_size: desc.calculated_file_size,
            header: desc.header,
            sha256: None,
        })
    }

    /// Byte range of this file within the scanned source.
    pub fn range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset.saturating_add(self.length)
    }

    /// Fills in the SHA-256 of the carved bytes taken from `source`.
    pub fn compute_digest(&mut self, source: &[u8]) {
        let range = self.range();
        let start = usize::try_from(range.start).unwrap_or(usize::MAX);
        let end = usize::try_from(range.end)
            .unwrap_or(usize::MAX)
            .min(source.len());
        if let Some(bytes) = source.get(start..end) {
            self.sha256 = Some(hex::encode(Sha256::digest(bytes)));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Positions where a registered pattern matched
    pub candidates: usize,
    /// Candidates skipped for not sitting on the configured alignment
    pub unaligned: usize,
    pub rejected: usize,
    /// Identified, then dropped by a size check
    pub dropped: usize,
    pub carved: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub source_size: u64,
    pub files: Vec<CarvedFile>,
    pub stats: ScanStats,
}

enum Outcome {
    Carved(CarvedFile),
    Rejected,
    Dropped,
}

/// Slides the registry over a source and collects every carvable file.
pub struct Carver<'a> {
    registry: &'a SignatureRegistry,
    config: ScanConfig,
}

impl<'a> Carver<'a> {
    pub fn new(registry: &'a SignatureRegistry, config: ScanConfig) -> Self {
        Self { registry, config }
    }

    pub fn scan(&self, data: &[u8]) -> ScanReport {
        info!(
            size = data.len(),
            alignment = self.config.alignment,
            parallel = self.config.parallel,
            "scan started"
        );

        let starts = self.candidate_starts(data);
        let mut stats = ScanStats {
            candidates: starts.len(),
            ..Default::default()
        };

        let aligned: Vec<usize> = starts
            .into_iter()
            .filter(|s| s % self.config.alignment.max(1) == 0)
            .collect();
        stats.unaligned = stats.candidates - aligned.len();

        let outcomes: Vec<Outcome> = if self.config.parallel {
            aligned.par_iter().map(|&s| self.evaluate(data, s)).collect()
        } else {
            aligned.iter().map(|&s| self.evaluate(data, s)).collect()
        };

        let mut files = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Carved(file) => files.push(file),
                Outcome::Rejected => stats.rejected += 1,
                Outcome::Dropped => stats.dropped += 1,
            }
        }
        stats.carved = files.len();

        info!(
            candidates = stats.candidates,
            carved = stats.carved,
            rejected = stats.rejected,
            dropped = stats.dropped,
            "scan finished"
        );

        ScanReport {
            source_size: data.len() as u64,
            files,
            stats,
        }
    }

    /// Sorted candidate starts of the configured variants; chunks overlap
    /// by the longest signature span so no match is lost at a chunk boundary.
    fn candidate_starts(&self, data: &[u8]) -> Vec<usize> {
        let variants = &self.config.variants;
        if !self.config.parallel || data.len() <= self.config.chunk_size {
            return self
                .registry
                .candidate_starts_in(data, 0..data.len(), variants);
        }

        let chunk = self.config.chunk_size.max(1);
        let overlap = self.registry.max_pattern_span().saturating_sub(1);

        let mut starts: Vec<usize> = (0..data.len())
            .step_by(chunk)
            .collect::<Vec<_>>()
            .into_par_iter()
            .flat_map_iter(|base| {
                let end = base.saturating_add(chunk + overlap).min(data.len());
                self.registry.candidate_starts_in(data, base..end, variants)
            })
            .collect();

        starts.sort_unstable();
        starts.dedup();
        starts
    }

    fn evaluate(&self, data: &[u8], start: usize) -> Outcome {
        let buffer = &data[start..];
        let remaining = buffer.len() as u64;
        let limit = remaining.min(self.config.max_file_size);

        let mut desc = match self
            .registry
            .dispatch_among(
                buffer,
                ProbeMode::Full,
                self.config.policy,
                limit,
                &self.config.variants,
            )
        {
            Ok(desc) => desc,
            Err(reason) => {
                log_rejection(start, &reason);
                return Outcome::Rejected;
            }
        };
        desc.max_filesize = desc.max_filesize.min(self.config.max_file_size);

        match desc.settle_length(remaining) {
            Ok(length) => match CarvedFile::from_descriptor(start as Offset, length, desc) {
                Some(file) => Outcome::Carved(file),
                None => Outcome::Rejected,
            },
            Err(outcome) => {
                warn!(
                    offset = start,
                    extension = desc.extension,
                    reason = outcome.reason(),
                    ?outcome,
                    "dropped candidate"
                );
                Outcome::Dropped
            }
        }
    }
}

fn log_rejection(offset: usize, reason: &Rejection) {
    if !reason.is_not_matched() {
        trace!(offset, %reason, "candidate rejected");
    }
}
