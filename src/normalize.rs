//! Element-list normalization.
//!
//! [`normalize`] is a pure pass establishing the invariants the renderer
//! relies on: dense 1..N trench indices, resolved child references, at most
//! one passage (or, exclusive of that, one connection) per seam, and dense
//! per-trench surface sequence numbers. Dangling references are recovered
//! silently here — they never surface as renderer errors.

use std::collections::{HashMap, HashSet};

use crate::elements::{ConnectionSpec, Element};

/// Normalize an element list. Returns a new list; running the pass on its
/// own output is a no-op.
pub fn normalize(elements: Vec<Element>) -> Vec<Element> {
    // Old trench index -> new dense index. An absent index counts as the
    // trench's 1-based position; later duplicates win.
    let mut idx_map: HashMap<usize, usize> = HashMap::new();
    let mut n = 0usize;
    for e in &elements {
        if let Element::Trench(t) = e {
            n += 1;
            let old = if t.trench_index > 0 { t.trench_index } else { n };
            idx_map.insert(old, n);
        }
    }

    let mut keep: Vec<Element> = Vec::new();
    let mut pass_buffer = Vec::new();
    let mut next_index = 0usize;

    for e in elements {
        match e {
            Element::Trench(mut t) => {
                next_index += 1;
                t.trench_index = next_index;
                keep.push(Element::Trench(t));
            }
            Element::Pipe(mut p) => {
                if let Some(&mapped) = idx_map.get(&p.for_trench) {
                    p.for_trench = mapped;
                    keep.push(Element::Pipe(p));
                } else if p.for_trench == 0 && n > 0 {
                    p.for_trench = n;
                    keep.push(Element::Pipe(p));
                } else {
                    crate::log::warn!("dropping pipe with dangling for_trench {}", p.for_trench);
                }
            }
            Element::Surface(mut s) => {
                if let Some(&mapped) = idx_map.get(&s.for_trench) {
                    s.for_trench = mapped;
                    keep.push(Element::Surface(s));
                } else if s.for_trench == 0 && n > 0 {
                    s.for_trench = n;
                    keep.push(Element::Surface(s));
                } else {
                    crate::log::warn!(
                        "dropping surface with dangling for_trench {}",
                        s.for_trench
                    );
                }
            }
            Element::Passage(p) => match p.between {
                Some(b) if (1..n).contains(&b) => keep.push(Element::Passage(p)),
                Some(_) => {}
                // Legacy form without a seam: numbered in order below.
                None => pass_buffer.push(p),
            },
            Element::Connection(c) => {
                if let Some(b) = c.between {
                    if (1..n).contains(&b) {
                        keep.push(Element::Connection(ConnectionSpec {
                            between: Some(b),
                            group: Vec::new(),
                        }));
                    }
                } else {
                    // Group form: consecutive trench numbers map onto the
                    // pairwise adjacent seams; anything else is dropped.
                    let group: Vec<usize> =
                        c.group.iter().copied().filter(|&g| g >= 1 && g <= n).collect();
                    for pair in group.windows(2) {
                        let (a, b) = (pair[0], pair[1]);
                        if a.abs_diff(b) == 1 {
                            let seam = a.min(b);
                            if (1..n).contains(&seam) {
                                keep.push(Element::Connection(ConnectionSpec {
                                    between: Some(seam),
                                    group: Vec::new(),
                                }));
                            }
                        }
                    }
                }
            }
            Element::AufmassOverride(mut o) => {
                o.lines = o
                    .lines
                    .iter()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                keep.push(Element::AufmassOverride(o));
            }
        }
    }

    // Buffered legacy passages take the seams 1, 2, … in arrival order;
    // surplus passages (more than there are seams) are dropped.
    for (k, mut p) in pass_buffer.into_iter().enumerate() {
        let seam = k + 1;
        if seam < n {
            p.between = Some(seam);
            keep.push(Element::Passage(p));
        }
    }

    renumber_surface_seqs(&mut keep);
    dedup_passages(&mut keep, n);
    dedup_connections(&mut keep, n);

    keep
}

/// Renumber surface `seq` values densely 1..k per owning trench, keeping
/// the existing relative order (missing `seq` sorts last).
fn renumber_surface_seqs(keep: &mut [Element]) {
    let mut buckets: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, e) in keep.iter().enumerate() {
        if let Element::Surface(s) = e {
            buckets.entry(s.for_trench).or_default().push(i);
        }
    }
    for positions in buckets.values() {
        let mut ordered = positions.clone();
        ordered.sort_by_key(|&i| match &keep[i] {
            Element::Surface(s) => s.seq.unwrap_or(usize::MAX),
            _ => unreachable!(),
        });
        for (k, &i) in ordered.iter().enumerate() {
            if let Element::Surface(s) = &mut keep[i] {
                s.seq = Some(k + 1);
            }
        }
    }
}

/// Keep at most one passage per seam; the last one in list order wins.
fn dedup_passages(keep: &mut Vec<Element>, n: usize) {
    let mut seen = HashSet::new();
    let mut remove = Vec::new();
    for i in (0..keep.len()).rev() {
        if let Element::Passage(p) = &keep[i] {
            let seam = p.between.unwrap_or(0);
            if !(1..n).contains(&seam) || !seen.insert(seam) {
                remove.push(i);
            }
        }
    }
    for i in remove {
        keep.remove(i);
    }
}

/// Keep at most one connection per seam; a passage at the same seam takes
/// precedence and discards the connection.
fn dedup_connections(keep: &mut Vec<Element>, n: usize) {
    let pass_seams: HashSet<usize> = keep
        .iter()
        .filter_map(|e| match e {
            Element::Passage(p) => p.between,
            _ => None,
        })
        .collect();
    let mut seen = HashSet::new();
    let mut remove = Vec::new();
    for i in (0..keep.len()).rev() {
        if let Element::Connection(c) = &keep[i] {
            let seam = c.between.unwrap_or(0);
            if !(1..n).contains(&seam) || pass_seams.contains(&seam) || !seen.insert(seam) {
                remove.push(i);
            }
        }
    }
    for i in remove {
        keep.remove(i);
    }
}
