// Edit operations and the Delta container.
//
// A Delta is the ordered edit script that turns one version into the next.
// Its serialized form is a JSON array of `{"op": ..., "char": ...}` records;
// the conversion is validated so a malformed record never becomes an EditOp.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EditOp
// ---------------------------------------------------------------------------

/// A single per-character edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "OpRecord", into = "OpRecord")]
pub enum EditOp {
    /// Copy one input character (which must equal the payload) to the output.
    Keep(char),
    /// Write a character without consuming input.
    Insert(char),
    /// Consume one input character without writing.
    Delete,
}

impl EditOp {
    /// Number of input characters this op consumes.
    #[inline]
    pub fn consumes(&self) -> usize {
        match self {
            Self::Keep(_) | Self::Delete => 1,
            Self::Insert(_) => 0,
        }
    }

    /// Number of output characters this op produces.
    #[inline]
    pub fn produces(&self) -> usize {
        match self {
            Self::Keep(_) | Self::Insert(_) => 1,
            Self::Delete => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OpTag {
    Keep,
    Insert,
    Delete,
}

/// Persisted form of one [`EditOp`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct OpRecord {
    op: OpTag,
    #[serde(rename = "char", default, skip_serializing_if = "Option::is_none")]
    ch: Option<String>,
}

/// Reasons an op record cannot be turned into an [`EditOp`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidOp {
    #[error("'{op}' op is missing its char")]
    MissingChar { op: &'static str },
    #[error("'{op}' op char must be exactly one character, got {len}")]
    CharLength { op: &'static str, len: usize },
    #[error("'delete' op must not carry a char")]
    UnexpectedChar,
}

fn single_char(op: &'static str, s: Option<String>) -> Result<char, InvalidOp> {
    let s = s.ok_or(InvalidOp::MissingChar { op })?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(InvalidOp::CharLength {
            op,
            len: s.chars().count(),
        }),
    }
}

impl TryFrom<OpRecord> for EditOp {
    type Error = InvalidOp;

    fn try_from(rec: OpRecord) -> Result<Self, Self::Error> {
        match rec.op {
            OpTag::Keep => single_char("keep", rec.ch).map(Self::Keep),
            OpTag::Insert => single_char("insert", rec.ch).map(Self::Insert),
            OpTag::Delete if rec.ch.is_some() => Err(InvalidOp::UnexpectedChar),
            OpTag::Delete => Ok(Self::Delete),
        }
    }
}

impl From<EditOp> for OpRecord {
    fn from(op: EditOp) -> Self {
        match op {
            EditOp::Keep(c) => Self {
                op: OpTag::Keep,
                ch: Some(c.to_string()),
            },
            EditOp::Insert(c) => Self {
                op: OpTag::Insert,
                ch: Some(c.to_string()),
            },
            EditOp::Delete => Self {
                op: OpTag::Delete,
                ch: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// Ordered edit script transforming one version into the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
    ops: Vec<EditOp>,
}

/// Op counts for a single delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaStats {
    pub keeps: usize,
    pub inserts: usize,
    pub deletes: usize,
}

impl DeltaStats {
    /// Number of ops that change the text.
    pub fn edits(&self) -> usize {
        self.inserts + self.deletes
    }
}

impl Delta {
    pub fn new(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    pub fn stats(&self) -> DeltaStats {
        let mut stats = DeltaStats::default();
        for op in &self.ops {
            match op {
                EditOp::Keep(_) => stats.keeps += 1,
                EditOp::Insert(_) => stats.inserts += 1,
                EditOp::Delete => stats.deletes += 1,
            }
        }
        stats
    }

    /// True if applying this delta reproduces its input unchanged.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, EditOp::Keep(_)))
    }

    /// Length (in chars) of the input this delta expects.
    pub fn source_len(&self) -> usize {
        self.ops.iter().map(EditOp::consumes).sum()
    }

    /// Length (in chars) of the output this delta produces.
    pub fn target_len(&self) -> usize {
        self.ops.iter().map(EditOp::produces).sum()
    }
}

impl FromIterator<EditOp> for Delta {
    fn from_iter<I: IntoIterator<Item = EditOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a EditOp;
    type IntoIter = std::slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// ndiff-style listing, one op per line: `  c` keep, `+ c` insert, `-` delete.
impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            match op {
                EditOp::Keep(c) => writeln!(f, "  {}", c.escape_debug())?,
                EditOp::Insert(c) => writeln!(f, "+ {}", c.escape_debug())?,
                EditOp::Delete => writeln!(f, "-")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
