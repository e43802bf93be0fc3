// Myers O(ND) shortest edit script over chars, in linear space.
//
// The common prefix and suffix are emitted as Keep ops directly. The differing
// middle is split recursively on a "middle snake": a forward search from the
// start and a backward search from the end run one edit step at a time until
// their frontiers overlap on a diagonal, and that snake splits the problem into
// two halves that are solved the same way. Only two frontier arrays of
// `n + m + 3` slots are kept, reused across the whole recursion.
//
// Tie-breaking is fixed, so the script for a given (old, new) pair is the same
// on every run:
//   - both frontiers enter diagonal k at step d from k+1 (an insertion) when
//     k == -d, or when k != d and V[k-1] < V[k+1]; otherwise from k-1 (a
//     deletion)
//   - diagonals are scanned from -d to d, the forward frontier before the
//     backward one, and the first overlap found is the split point
//   - a stretch with no char in common is emitted as all its deletions
//     followed by all its insertions

use std::collections::BTreeSet;

use super::op::{Delta, EditOp};

/// Compute the edit script turning `old` into `new`.
///
/// The result satisfies `apply_delta(old, &compute_delta(old, new)) == new`.
pub fn compute_delta(old: &str, new: &str) -> Delta {
    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();

    let prefix = common_prefix(&a, &b);
    let suffix = common_suffix(&a[prefix..], &b[prefix..]);

    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    let mut ops = Vec::with_capacity(a.len().max(b.len()) + mid_a.len().min(mid_b.len()));
    ops.extend(a[..prefix].iter().map(|&c| EditOp::Keep(c)));
    shortest_edit(mid_a, mid_b, &mut ops);
    ops.extend(a[a.len() - suffix..].iter().map(|&c| EditOp::Keep(c)));

    log::trace!(
        "diff: {} -> {} chars, prefix {prefix}, suffix {suffix}, {} ops",
        a.len(),
        b.len(),
        ops.len()
    );

    Delta::new(ops)
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Append the shortest edit script for `a -> b` to `out`.
fn shortest_edit(a: &[char], b: &[char], out: &mut Vec<EditOp>) {
    if a.is_empty() || b.is_empty() {
        replace(a, b, out);
        return;
    }

    let max_d = (a.len() + b.len()).div_ceil(2);
    let mut fwd = Frontier::new(max_d);
    let mut bwd = Frontier::new(max_d);
    conquer(a, b, &mut fwd, &mut bwd, out);
}

/// Delete every char of `a`, then insert every char of `b`.
fn replace(a: &[char], b: &[char], out: &mut Vec<EditOp>) {
    out.extend(std::iter::repeat_n(EditOp::Delete, a.len()));
    out.extend(b.iter().map(|&c| EditOp::Insert(c)));
}

fn disjoint(a: &[char], b: &[char]) -> bool {
    let seen: BTreeSet<char> = b.iter().copied().collect();
    !a.iter().any(|c| seen.contains(c))
}

fn conquer(
    a: &[char],
    b: &[char],
    fwd: &mut Frontier,
    bwd: &mut Frontier,
    out: &mut Vec<EditOp>,
) {
    let prefix = common_prefix(a, b);
    out.extend(a[..prefix].iter().map(|&c| EditOp::Keep(c)));
    let (a, b) = (&a[prefix..], &b[prefix..]);

    let suffix = common_suffix(a, b);
    let mid_a = &a[..a.len() - suffix];
    let mid_b = &b[..b.len() - suffix];

    if mid_a.is_empty() || mid_b.is_empty() || disjoint(mid_a, mid_b) {
        replace(mid_a, mid_b, out);
    } else {
        match middle_snake(mid_a, mid_b, fwd, bwd) {
            Some((x, y)) => {
                conquer(&mid_a[..x], &mid_b[..y], fwd, bwd, out);
                conquer(&mid_a[x..], &mid_b[y..], fwd, bwd, out);
            }
            // Unreachable for non-empty inputs; still a valid script.
            None => replace(mid_a, mid_b, out),
        }
    }

    out.extend(a[a.len() - suffix..].iter().map(|&c| EditOp::Keep(c)));
}

/// Furthest x reached on each diagonal `k` in `-max_d-1..=max_d+1`.
struct Frontier {
    v: Vec<isize>,
    offset: isize,
}

impl Frontier {
    fn new(max_d: usize) -> Self {
        Self {
            v: vec![0; 2 * max_d + 3],
            offset: max_d as isize + 1,
        }
    }

    #[inline]
    fn get(&self, k: isize) -> isize {
        self.v[(k + self.offset) as usize]
    }

    #[inline]
    fn set(&mut self, k: isize, x: isize) {
        self.v[(k + self.offset) as usize] = x;
    }

    /// Starting x on diagonal `k` at step `d`, before following the snake.
    #[inline]
    fn enter(&self, k: isize, d: isize) -> isize {
        if k == -d || (k != d && self.get(k - 1) < self.get(k + 1)) {
            self.get(k + 1)
        } else {
            self.get(k - 1) + 1
        }
    }
}

/// Find the point where an optimal path for `a -> b` crosses its middle snake.
///
/// `a` and `b` must be non-empty. The returned `(x, y)` is the start of the
/// snake, with `0 < x + y < n + m`.
fn middle_snake(
    a: &[char],
    b: &[char],
    fwd: &mut Frontier,
    bwd: &mut Frontier,
) -> Option<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    // Forward diagonal k is backward diagonal delta - k.
    let delta = n - m;
    let odd = delta & 1 != 0;
    let max_d = (n + m + 1) / 2;

    fwd.set(1, 0);
    bwd.set(1, 0);

    for d in 0..=max_d {
        let mut k = -d;
        while k <= d {
            let x0 = fwd.enter(k, d);
            let y0 = x0 - k;
            let (mut x, mut y) = (x0, y0);
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            fwd.set(k, x);
            if odd
                && (k - delta).abs() < d
                && x <= n
                && y <= m
                && x + bwd.get(delta - k) >= n
            {
                return Some((x0 as usize, y0 as usize));
            }
            k += 2;
        }

        let mut k = -d;
        while k <= d {
            let mut x = bwd.enter(k, d);
            let mut y = x - k;
            while x < n && y < m && a[(n - 1 - x) as usize] == b[(m - 1 - y) as usize] {
                x += 1;
                y += 1;
            }
            bwd.set(k, x);
            if !odd
                && (k - delta).abs() <= d
                && x <= n
                && y <= m
                && x + fwd.get(delta - k) >= n
            {
                return Some(((n - x) as usize, (m - y) as usize));
            }
            k += 2;
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
