//! Signature registry
//!
//! Holds the magic patterns of every enabled variant and dispatches a
//! candidate position to their identification entry points. Pattern search
//! over a whole buffer uses a single Aho-Corasick automaton.
//!
//! The registry is built once at startup and handed to the scanner by
//! reference; nothing in it changes while a scan is running.

use std::fmt;
use std::ops::Range;

use aho_corasick::AhoCorasick;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::Rejection;
use crate::formats::berkeleydb;
use crate::types::{FormatDescriptor, ProbeMode, Variant};

/// Identification entry point of one variant.
pub type IdentifyFn =
    fn(&[u8], ProbeMode, Option<&FormatDescriptor>) -> Result<FormatDescriptor, Rejection>;

/// A registered `(pattern, offset, identify)` triple.
#[derive(Clone)]
pub struct Signature {
    variant: Variant,
    pattern: &'static [u8],
    /// Offset from the candidate start where `pattern` must appear
    offset: usize,
    identify: IdentifyFn,
}

impl Signature {
    pub fn new(
        variant: Variant,
        pattern: &'static [u8],
        offset: usize,
        identify: IdentifyFn,
    ) -> Self {
        Self {
            variant,
            pattern,
            offset,
            identify,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn pattern(&self) -> &'static [u8] {
        self.pattern
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Checks whether `data` carries this signature's pattern at its offset
    pub fn matches(&self, data: &[u8]) -> bool {
        let end = self.offset + self.pattern.len();
        data.get(self.offset..end) == Some(self.pattern)
    }

    pub fn identify(
        &self,
        buffer: &[u8],
        mode: ProbeMode,
        prior: Option<&FormatDescriptor>,
    ) -> Result<FormatDescriptor, Rejection> {
        (self.identify)(buffer, mode, prior)
    }

    fn same_key(&self, other: &Signature) -> bool {
        self.variant == other.variant
            && self.pattern == other.pattern
            && self.offset == other.offset
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("variant", &self.variant)
            .field("pattern", &self.pattern)
            .field("offset", &self.offset)
            .finish()
    }
}

/// Which handler wins when several accept the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchPolicy {
    /// Registration order; the first handler that does not reject wins.
    #[default]
    FirstAccepted,
    /// Registration order, skipping descriptors whose calculated size cannot
    /// fit in what is left of the source. Falls back to the first accepted.
    FirstFitting,
}

impl std::str::FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-accepted" => Ok(Self::FirstAccepted),
            "first-fitting" => Ok(Self::FirstFitting),
            other => Err(format!(
                "unknown policy '{other}' (expected first-accepted or first-fitting)"
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct SignatureRegistry {
    signatures: Vec<Signature>,
    enabled: Vec<Variant>,
    matcher: Option<AhoCorasick>,
    /// Unique automaton pattern index -> signatures sharing that pattern and offset
    pattern_map: Vec<Vec<usize>>,
}

impl SignatureRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every known variant, little-endian first.
    pub fn with_defaults() -> Self {
        Self::with_variants(&Variant::ALL)
    }

    /// Registry with `variants`, in the given order.
    pub fn with_variants(variants: &[Variant]) -> Self {
        let mut registry = Self::new();
        for &variant in variants {
            berkeleydb::register(&mut registry, variant);
        }
        registry
    }

    /// Registers a signature. Registering an identical signature again is a
    /// no-op and returns `false`.
    pub fn register(&mut self, signature: Signature) -> bool {
        if self.signatures.iter().any(|s| s.same_key(&signature)) {
            trace!(variant = %signature.variant, "signature already registered");
            return false;
        }

        if !self.enabled.contains(&signature.variant) {
            self.enabled.push(signature.variant);
        }
        self.signatures.push(signature);
        self.build_matcher();
        true
    }

    fn build_matcher(&mut self) {
        let mut patterns: Vec<(&'static [u8], usize)> = Vec::new();
        let mut pattern_map: Vec<Vec<usize>> = Vec::new();

        for (idx, sig) in self.signatures.iter().enumerate() {
            if !self.enabled.contains(&sig.variant) {
                continue;
            }
            match patterns
                .iter()
                .position(|&(p, o)| p == sig.pattern && o == sig.offset)
            {
                Some(existing) => pattern_map[existing].push(idx),
                None => {
                    patterns.push((sig.pattern, sig.offset));
                    pattern_map.push(vec![idx]);
                }
            }
        }

        self.matcher = if patterns.is_empty() {
            None
        } else {
            AhoCorasick::new(patterns.iter().map(|&(p, _)| p)).ok()
        };
        self.pattern_map = pattern_map;
        debug!(
            signatures = self.signatures.len(),
            patterns = self.pattern_map.len(),
            "rebuilt signature matcher"
        );
    }

    /// Keeps only `variants` enabled
    pub fn filter_variants(&mut self, variants: &[Variant]) {
        self.enabled.retain(|v| variants.contains(v));
        self.build_matcher();
    }

    pub fn enabled_variants(&self) -> &[Variant] {
        &self.enabled
    }

    /// Enabled signatures in registration order
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures
            .iter()
            .filter(|s| self.enabled.contains(&s.variant))
    }

    pub fn len(&self) -> usize {
        self.signatures().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Longest `offset + pattern` among enabled signatures.
    pub fn max_pattern_span(&self) -> usize {
        self.signatures()
            .map(|s| s.offset + s.pattern.len())
            .max()
            .unwrap_or(0)
    }

    /// Candidate file starts in `data`, sorted and without duplicates.
    pub fn candidate_starts(&self, data: &[u8]) -> Vec<usize> {
        self.candidate_starts_in(data, 0..data.len(), &self.enabled)
    }

    /// Candidate file starts for `variants` whose pattern lies in
    /// `data[window]`, as positions in `data`.
    ///
    /// A pattern found at position `p` for a signature with offset `o`
    /// yields the candidate `p - o`, even when that start falls before the
    /// window. Matches too close to the start of `data` to have room for the
    /// offset are skipped.
    pub fn candidate_starts_in(
        &self,
        data: &[u8],
        window: Range<usize>,
        variants: &[Variant],
    ) -> Vec<usize> {
        let Some(matcher) = &self.matcher else {
            return Vec::new();
        };
        let Some(haystack) = data.get(window.clone()) else {
            return Vec::new();
        };

        let base = window.start;
        let mut starts: Vec<usize> = matcher
            .find_overlapping_iter(haystack)
            .flat_map(move |mat| {
                let found = base + mat.start();
                self.pattern_map[mat.pattern().as_usize()]
                    .iter()
                    .map(move |&idx| &self.signatures[idx])
                    .filter(move |sig| variants.contains(&sig.variant))
                    .filter_map(move |sig| found.checked_sub(sig.offset))
            })
            .collect();

        starts.sort_unstable();
        starts.dedup();
        starts
    }

    /// Runs every enabled handler whose pattern matches at the start of
    /// `buffer` and picks one according to `policy`.
    pub fn dispatch(
        &self,
        buffer: &[u8],
        mode: ProbeMode,
        policy: DispatchPolicy,
        limit: u64,
    ) -> Result<FormatDescriptor, Rejection> {
        self.dispatch_among(buffer, mode, policy, limit, &self.enabled)
    }

    /// Like [`dispatch`](Self::dispatch), restricted to `variants` and
    /// trying them in the order given.
    ///
    /// `limit` is the number of bytes a carved file may span from this
    /// position; it is only consulted by [`DispatchPolicy::FirstFitting`].
    /// Returns [`Rejection::NotMatched`] when no handler applies, otherwise
    /// the first handler's rejection when all of them reject.
    pub fn dispatch_among(
        &self,
        buffer: &[u8],
        mode: ProbeMode,
        policy: DispatchPolicy,
        limit: u64,
        variants: &[Variant],
    ) -> Result<FormatDescriptor, Rejection> {
        let mut first_accepted: Option<FormatDescriptor> = None;
        let mut first_rejection: Option<Rejection> = None;

        let handlers = variants.iter().flat_map(move |&variant| {
            self.signatures()
                .filter(move |s| s.variant == variant && s.matches(buffer))
        });

        for sig in handlers {
            match sig.identify(buffer, mode, None) {
                Ok(desc) => {
                    let fits = desc.calculated_file_size.is_none_or(|size| size <= limit);
                    match policy {
                        DispatchPolicy::FirstAccepted => return Ok(desc),
                        DispatchPolicy::FirstFitting if fits => return Ok(desc),
                        DispatchPolicy::FirstFitting => {
                            trace!(variant = %sig.variant, "calculated size exceeds limit");
                            first_accepted.get_or_insert(desc);
                        }
                    }
                }
                Err(reason) => {
                    first_rejection.get_or_insert(reason);
                }
            }
        }

        match (first_accepted, first_rejection) {
            (Some(desc), _) => Ok(desc),
            (None, Some(reason)) => Err(reason),
            (None, None) => Err(Rejection::NotMatched),
        }
    }
}
