//! Synthetic genome construction: rearrangements and indels injected into a
//! reference region, with a ledger that reproduces the result exactly.

use crate::error::{BenchError, Result};
use crate::io::reference::ReferenceAccessor;
use crate::sim::random::RandomModel;
use crate::types::{Locus, Region};
use bio::alphabets::dna;
use log::debug;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Placement attempts allowed per event before the build gives up.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1000;
pub const DEFAULT_MAX_INDEL_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RearrangementKind {
    Deletion,
    Duplication,
    Inversion,
    Translocation,
}

impl RearrangementKind {
    const ALL: [RearrangementKind; 4] = [
        RearrangementKind::Deletion,
        RearrangementKind::Duplication,
        RearrangementKind::Inversion,
        RearrangementKind::Translocation,
    ];
}

impl fmt::Display for RearrangementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RearrangementKind::Deletion => "deletion",
            RearrangementKind::Duplication => "duplication",
            RearrangementKind::Inversion => "inversion",
            RearrangementKind::Translocation => "translocation",
        };
        f.write_str(name)
    }
}

/// One rearrangement. `left` and `right` are the reference-frame positions
/// joined by the new junction; `span` and `target` describe the edit in the
/// working sequence at the moment it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakpoint {
    pub kind: RearrangementKind,
    pub left: Locus,
    pub right: Locus,
    pub span: Range<usize>,
    /// Re-insertion index for translocations, counted after the span is cut out.
    pub target: Option<usize>,
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.left, self.right, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndelKind {
    Insertion,
    Deletion,
}

impl fmt::Display for IndelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndelKind::Insertion => f.write_str("insertion"),
            IndelKind::Deletion => f.write_str("deletion"),
        }
    }
}

/// An indel at its final position in the mutated sequence. `bases` holds the
/// inserted or the removed bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndelRecord {
    pub position: usize,
    pub kind: IndelKind,
    pub length: usize,
    pub bases: Vec<u8>,
}

impl fmt::Display for IndelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.position,
            self.kind,
            self.length,
            String::from_utf8_lossy(&self.bases)
        )
    }
}

/// Mutated sequence together with the ledgers that produced it.
#[derive(Debug, Clone)]
pub struct SimulatedGenome {
    region: Region,
    original_length: usize,
    sequence: Vec<u8>,
    breakpoints: Vec<Breakpoint>,
    indels: Vec<IndelRecord>,
}

impl SimulatedGenome {
    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn indels(&self) -> &[IndelRecord] {
        &self.indels
    }

    pub fn original_length(&self) -> usize {
        self.original_length
    }

    /// Net length change caused by the indel ledger alone.
    pub fn indel_delta(&self) -> isize {
        self.indels
            .iter()
            .map(|i| match i.kind {
                IndelKind::Insertion => i.length as isize,
                IndelKind::Deletion => -(i.length as isize),
            })
            .sum()
    }

    /// Net length change caused by the rearrangements alone.
    pub fn rearrangement_delta(&self) -> isize {
        self.breakpoints
            .iter()
            .map(|b| match b.kind {
                RearrangementKind::Deletion => -(b.span.len() as isize),
                RearrangementKind::Duplication => b.span.len() as isize,
                _ => 0,
            })
            .sum()
    }

    /// Re-applies both ledgers to `original`.
    pub fn replay(&self, original: &[u8]) -> Vec<u8> {
        replay_ledger(original, &self.breakpoints, &self.indels)
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<Breakpoint>, Vec<IndelRecord>) {
        (self.sequence, self.breakpoints, self.indels)
    }
}

/// Rebuilds a mutated sequence from the original region and its ledgers.
pub fn replay_ledger(original: &[u8], breakpoints: &[Breakpoint], indels: &[IndelRecord]) -> Vec<u8> {
    let mut seq = original.to_vec();
    for bp in breakpoints {
        rearrange(&mut seq, bp.kind, bp.span.clone(), bp.target, |&b| dna::complement(b));
    }
    for indel in indels {
        match indel.kind {
            IndelKind::Insertion => {
                seq.splice(indel.position..indel.position, indel.bases.iter().copied());
            }
            IndelKind::Deletion => {
                seq.drain(indel.position..indel.position + indel.length);
            }
        }
    }
    seq
}

/// The single edit routine used both while building and while replaying.
fn rearrange<T: Clone>(
    items: &mut Vec<T>,
    kind: RearrangementKind,
    span: Range<usize>,
    target: Option<usize>,
    flip: impl Fn(&T) -> T,
) {
    match kind {
        RearrangementKind::Deletion => {
            items.drain(span);
        }
        RearrangementKind::Duplication => {
            let copy = items[span.clone()].to_vec();
            items.splice(span.end..span.end, copy);
        }
        RearrangementKind::Inversion => {
            let inverted: Vec<T> = items[span.clone()].iter().rev().map(&flip).collect();
            items.splice(span, inverted);
        }
        RearrangementKind::Translocation => {
            let moved: Vec<T> = items.drain(span).collect();
            let at = target.unwrap_or(0).min(items.len());
            items.splice(at..at, moved);
        }
    }
}

#[derive(Debug, Clone)]
struct Cell {
    base: u8,
    origin: usize,
    locked: bool,
}

impl Cell {
    fn flipped(&self) -> Cell {
        Cell {
            base: dna::complement(self.base),
            origin: self.origin,
            locked: self.locked,
        }
    }
}

/// Builds mutated copies of a reference region.
#[derive(Debug, Clone)]
pub struct SyntheticGenomeBuilder {
    break_count: usize,
    indel_count: usize,
    max_indel_length: usize,
    max_attempts: usize,
}

impl SyntheticGenomeBuilder {
    pub fn new(break_count: usize, indel_count: usize) -> Self {
        Self {
            break_count,
            indel_count,
            max_indel_length: DEFAULT_MAX_INDEL_LENGTH,
            max_attempts: MAX_PLACEMENT_ATTEMPTS,
        }
    }

    pub fn with_max_indel_length(mut self, length: usize) -> Self {
        self.max_indel_length = length.max(1);
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn build<R>(
        &self,
        region: &Region,
        reference: &mut R,
        rng: &mut RandomModel,
    ) -> Result<SimulatedGenome>
    where
        R: ReferenceAccessor + ?Sized,
    {
        let original = reference.fetch(region)?;
        self.build_from_sequence(region, &original, rng)
    }

    pub fn build_from_sequence(
        &self,
        region: &Region,
        original: &[u8],
        rng: &mut RandomModel,
    ) -> Result<SimulatedGenome> {
        if original.is_empty() {
            return Err(BenchError::parameter(format!(
                "region {} resolved to an empty sequence",
                region
            )));
        }

        let mut cells: Vec<Cell> = original
            .iter()
            .enumerate()
            .map(|(origin, &base)| Cell {
                base: base.to_ascii_uppercase(),
                origin,
                locked: false,
            })
            .collect();

        let max_span = (original.len() / (4 * self.break_count.max(1))).max(1);
        let mut breakpoints = Vec::with_capacity(self.break_count);
        for _ in 0..self.break_count {
            let bp = self.place_rearrangement(&mut cells, region, max_span, rng)?;
            debug!(
                "{} at {}..{} joins {}:{} to {}:{}",
                bp.kind, bp.span.start, bp.span.end, bp.left.chrom, bp.left.pos, bp.right.chrom, bp.right.pos
            );
            breakpoints.push(bp);
        }

        let mut sequence: Vec<u8> = cells.into_iter().map(|c| c.base).collect();
        let indels = self.place_indels(&mut sequence, rng)?;

        Ok(SimulatedGenome {
            region: region.clone(),
            original_length: original.len(),
            sequence,
            breakpoints,
            indels,
        })
    }

    fn place_rearrangement(
        &self,
        cells: &mut Vec<Cell>,
        region: &Region,
        max_span: usize,
        rng: &mut RandomModel,
    ) -> Result<Breakpoint> {
        let locus = |cell: &Cell| Locus::new(region.chrom.clone(), region.start + cell.origin as u64);

        for _ in 0..self.max_attempts {
            let kind = RearrangementKind::ALL[rng.range(0, 4)];
            let len = cells.len();
            let span_len = rng.range_inclusive(1, max_span);
            // Both flanks of the span must exist.
            if len < span_len + 2 {
                continue;
            }
            let start = rng.range_inclusive(1, len - span_len - 1);
            let span = start..start + span_len;
            if cells[start - 1..=span.end].iter().any(|c| c.locked) {
                continue;
            }

            let (left, right, target) = match kind {
                RearrangementKind::Deletion => (locus(&cells[start - 1]), locus(&cells[span.end]), None),
                RearrangementKind::Duplication => {
                    (locus(&cells[span.end - 1]), locus(&cells[start]), None)
                }
                RearrangementKind::Inversion => {
                    (locus(&cells[start - 1]), locus(&cells[span.end - 1]), None)
                }
                RearrangementKind::Translocation => {
                    let remaining = len - span_len;
                    if remaining < 2 {
                        continue;
                    }
                    let t = rng.range_inclusive(1, remaining - 1);
                    // Index mapping into the sequence with the span cut out.
                    let rem = |i: usize| if i < start { i } else { i + span_len };
                    if t == start || cells[rem(t - 1)].locked || cells[rem(t)].locked {
                        continue;
                    }
                    (locus(&cells[rem(t - 1)]), locus(&cells[start]), Some(t))
                }
            };

            // Flanks and the edited span are frozen so later events cannot split them.
            for c in &mut cells[start - 1..=span.end] {
                c.locked = true;
            }
            if let Some(t) = target {
                let rem = |i: usize| if i < start { i } else { i + span_len };
                let (a, b) = (rem(t - 1), rem(t));
                cells[a].locked = true;
                cells[b].locked = true;
            }
            rearrange(cells, kind, span.clone(), target, Cell::flipped);

            return Ok(Breakpoint {
                kind,
                left,
                right,
                span,
                target,
            });
        }

        Err(BenchError::InsufficientRegionLength {
            what: "rearrangements",
            length: cells.len(),
            requested: self.break_count,
            attempts: self.max_attempts,
        })
    }

    /// Indels are drawn in the post-rearrangement frame, kept apart from each
    /// other, then applied left to right so every logged position is final.
    fn place_indels(&self, sequence: &mut Vec<u8>, rng: &mut RandomModel) -> Result<Vec<IndelRecord>> {
        struct Planned {
            position: usize,
            kind: IndelKind,
            length: usize,
        }

        let mut planned: Vec<Planned> = Vec::with_capacity(self.indel_count);
        for _ in 0..self.indel_count {
            let mut placed = false;
            for _ in 0..self.max_attempts {
                let kind = if rng.chance(0.5) {
                    IndelKind::Insertion
                } else {
                    IndelKind::Deletion
                };
                let length = rng.range_inclusive(1, self.max_indel_length);
                let position = match kind {
                    IndelKind::Insertion => rng.range_inclusive(0, sequence.len()),
                    IndelKind::Deletion if sequence.len() > length => {
                        rng.range_inclusive(0, sequence.len() - length)
                    }
                    IndelKind::Deletion => continue,
                };
                let footprint = match kind {
                    IndelKind::Insertion => 1,
                    IndelKind::Deletion => length,
                };
                // One base of clearance on each side keeps replay order unambiguous.
                let clashes = planned.iter().any(|p| {
                    let other = match p.kind {
                        IndelKind::Insertion => 1,
                        IndelKind::Deletion => p.length,
                    };
                    position <= p.position + other && p.position <= position + footprint
                });
                if clashes {
                    continue;
                }
                planned.push(Planned {
                    position,
                    kind,
                    length,
                });
                placed = true;
                break;
            }
            if !placed {
                return Err(BenchError::InsufficientRegionLength {
                    what: "indels",
                    length: sequence.len(),
                    requested: self.indel_count,
                    attempts: self.max_attempts,
                });
            }
        }

        planned.sort_by_key(|p| p.position);
        let mut offset: isize = 0;
        let mut records = Vec::with_capacity(planned.len());
        for p in planned {
            let position = (p.position as isize + offset) as usize;
            let bases = match p.kind {
                IndelKind::Insertion => {
                    let bases = rng.bases(p.length);
                    sequence.splice(position..position, bases.iter().copied());
                    offset += p.length as isize;
                    bases
                }
                IndelKind::Deletion => {
                    offset -= p.length as isize;
                    sequence.drain(position..position + p.length).collect()
                }
            };
            records.push(IndelRecord {
                position,
                kind: p.kind,
                length: p.length,
                bases,
            });
        }
        Ok(records)
    }
}
