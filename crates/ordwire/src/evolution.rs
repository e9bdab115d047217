// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cardinality evolution resolution.
//!
//! Decides, for each ordinal a reader's schema declares, whether the decoded
//! value is present, absent, or a malformed-buffer failure. The decision is a
//! pure function of the reader-side cardinality and the evidence the wire
//! offers at that ordinal:
//!
//! | wire evidence        | Required            | Asymmetric | Optional |
//! |----------------------|---------------------|------------|----------|
//! | payload (no marker)  | present             | present    | present  |
//! | marker set           | present             | present    | present  |
//! | marker unset         | `MalformedBuffer`   | absent     | absent   |
//! | buffer exhausted     | `MalformedBuffer`   | absent     | absent   |
//!
//! The "marker unset / Required" row is the promoted-field hazard: the reader
//! demands a value the writer never supplied. That is a schema-authoring
//! mistake, surfaced here as an explicit error rather than a panic. The
//! "exhausted" column is what lets an older writer's bytes satisfy a newer
//! reader: ordinals the writer never knew about simply decode as absent.

use crate::descriptor::Cardinality;
use crate::wire::WireError;

/// What the wire offers at a given ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEvidence {
    /// Payload bytes are available and the ordinal has no presence marker.
    Payload,
    /// The ordinal's presence marker was read and is set.
    MarkerSet,
    /// The ordinal's presence marker was read and is unset.
    MarkerUnset,
    /// The buffer ended before this ordinal (writer predates the field).
    Exhausted,
}

/// Decoded visibility of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Payload bytes follow and the field is exposed.
    Present,
    /// The field is omitted from the decoded value entirely.
    Absent,
}

/// Resolve the decoded visibility of a field.
///
/// `offset` is the reader position at the ordinal, reported in errors.
pub fn resolve(
    cardinality: Cardinality,
    evidence: WireEvidence,
    offset: usize,
) -> Result<Visibility, WireError> {
    match (evidence, cardinality) {
        (WireEvidence::Payload | WireEvidence::MarkerSet, _) => Ok(Visibility::Present),
        (WireEvidence::MarkerUnset, Cardinality::Required) => Err(WireError::MalformedBuffer {
            offset,
            reason: "required field marked absent by writer".into(),
        }),
        (WireEvidence::MarkerUnset, _) => Ok(Visibility::Absent),
        (WireEvidence::Exhausted, Cardinality::Required) => Err(WireError::MalformedBuffer {
            offset,
            reason: "buffer exhausted before required field".into(),
        }),
        (WireEvidence::Exhausted, _) => Ok(Visibility::Absent),
    }
}
