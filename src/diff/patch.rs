// Delta replay.
//
// Every op is accounted against the input: Keep and Delete consume exactly
// one input char, Keep must see the char it names, and the input must be
// fully consumed when the script ends. Anything else means the delta is being
// replayed against the wrong text and is reported, never clipped.

use super::op::{Delta, EditOp};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Replay failure for a single delta.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// A Keep/Delete op ran past the end of the input.
    #[error("op {op_index} needs input but all {input_len} chars are consumed")]
    InputExhausted { op_index: usize, input_len: usize },
    /// A Keep op names a different char than the input holds.
    #[error("op {op_index} keeps {expected:?} but input has {found:?}")]
    KeepMismatch {
        op_index: usize,
        expected: char,
        found: char,
    },
    /// The script ended with input left over.
    #[error("delta consumed {consumed} of {input_len} input chars")]
    TrailingInput { consumed: usize, input_len: usize },
}

// ---------------------------------------------------------------------------
// apply_delta
// ---------------------------------------------------------------------------

/// Replay `delta` against `old`, producing the next version.
pub fn apply_delta(old: &str, delta: &Delta) -> Result<String, PatchError> {
    let mut input = old.chars();
    let mut consumed = 0usize;
    let mut out = String::with_capacity(old.len() + delta.target_len());

    for (op_index, op) in delta.iter().enumerate() {
        match *op {
            EditOp::Insert(c) => out.push(c),
            EditOp::Keep(expected) => {
                let found = input.next().ok_or(PatchError::InputExhausted {
                    op_index,
                    input_len: consumed,
                })?;
                if found != expected {
                    return Err(PatchError::KeepMismatch {
                        op_index,
                        expected,
                        found,
                    });
                }
                consumed += 1;
                out.push(found);
            }
            EditOp::Delete => {
                input.next().ok_or(PatchError::InputExhausted {
                    op_index,
                    input_len: consumed,
                })?;
                consumed += 1;
            }
        }
    }

    let remaining = input.count();
    if remaining > 0 {
        return Err(PatchError::TrailingInput {
            consumed,
            input_len: consumed + remaining,
        });
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
