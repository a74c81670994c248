//! Quantity-survey ("Aufmaß") text composer.
//!
//! One line per drawn trench, pipe span, passage and surface segment,
//! reflecting exactly what the renderer emitted. Lines carry typed sort
//! keys from the start instead of being re-parsed from text: the canonical
//! order groups by category, then numeric index, then sub-index, stable on
//! ties. A manual override list (user reordering) is used verbatim as a
//! prefix; generated lines missing from it are appended afterwards.

use crate::elements::SurfaceSpec;
use crate::render::defaults::EPS_LEN;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Category {
    Trench,
    Pipe,
    Passage,
    Surface,
}

#[derive(Clone, Debug)]
struct Line {
    category: Category,
    index: usize,
    sub: usize,
    text: String,
}

/// Accumulates Aufmaß lines during rendering.
#[derive(Debug, Default)]
pub struct Aufmass {
    lines: Vec<Line>,
}

/// Format a meter value the way the survey text expects: minimal decimals,
/// but integral values keep one (`10.0`, `1.5`, `0.15`).
pub fn fmt_m(v: f64) -> String {
    let r = (v * 1e6).round() / 1e6;
    if (r - r.trunc()).abs() < 1e-9 {
        format!("{r:.1}")
    } else {
        let mut s = format!("{r:.6}");
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.push('0');
        }
        s
    }
}

impl Aufmass {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, category: Category, index: usize, sub: usize, text: String) {
        self.lines.push(Line {
            category,
            index,
            sub,
            text,
        });
    }

    /// Trench line; sloped floors report both side depths, a nonzero GOK
    /// is appended with its sign.
    pub fn trench(&mut self, n: usize, length: f64, width: f64, depths: (f64, f64, f64), gok: f64) {
        let (t_ref, t_left, t_right) = depths;
        let mut text = if (t_left - t_right).abs() < EPS_LEN {
            format!(
                "Baugraben {n}: l={} m  b={} m  t={} m",
                fmt_m(length),
                fmt_m(width),
                fmt_m(t_ref)
            )
        } else {
            format!(
                "Baugraben {n}: l={} m  b={} m  t_links={} m  t_rechts={} m",
                fmt_m(length),
                fmt_m(width),
                fmt_m(t_left),
                fmt_m(t_right)
            )
        };
        if gok.abs() > EPS_LEN {
            let signed = if gok >= 0.0 {
                format!("+{}", fmt_m(gok))
            } else {
                fmt_m(gok)
            };
            text.push_str(&format!("  GOK={signed} m"));
        }
        self.push(Category::Trench, n, 0, text);
    }

    pub fn pipe(&mut self, n: usize, effective: f64, diameter: f64, offset: f64) {
        let mut text = format!(
            "Rohr {n}: l={} m  Ø={} m",
            fmt_m(effective),
            fmt_m(diameter)
        );
        if offset != 0.0 {
            text.push_str(&format!("  Versatz={} m", fmt_m(offset)));
        }
        self.push(Category::Pipe, n, 0, text);
    }

    /// A continuous pipe spanning trenches `first..=last`.
    pub fn pipe_span(
        &mut self,
        first: usize,
        last: usize,
        effective: f64,
        diameter: f64,
        offset: f64,
    ) {
        let mut text = format!(
            "Rohr {first}–{last}: l={} m  Ø={} m",
            fmt_m(effective),
            fmt_m(diameter)
        );
        if offset != 0.0 {
            text.push_str(&format!("  Versatz={} m", fmt_m(offset)));
        }
        self.push(Category::Pipe, first, 0, text);
    }

    pub fn passage(&mut self, seam: usize, length: f64) {
        self.push(
            Category::Passage,
            seam,
            0,
            format!("Durchstich {seam}: l={} m", fmt_m(length)),
        );
    }

    /// Single uniform surface zone around trench `n`.
    pub fn surface_single(
        &mut self,
        n: usize,
        offset: f64,
        length: f64,
        width: f64,
        material: &str,
    ) {
        let mut text = format!(
            "Oberfläche {n}: Randzone={} m  l={} m  b={} m",
            fmt_m(offset),
            fmt_m(length),
            fmt_m(width)
        );
        if !material.is_empty() {
            text.push_str(&format!("  Material={material}"));
        }
        self.push(Category::Surface, n, 0, text);
    }

    /// Segmented surface zones. Each segment consumes its own length (the
    /// last one takes the remainder); the reported length includes the
    /// segment's border zone only on ends that are not internal merge
    /// boundaries.
    pub fn surface_segments(
        &mut self,
        n: usize,
        segments: &[&SurfaceSpec],
        trench_length: f64,
        trench_width: f64,
        left_free: bool,
        right_free: bool,
    ) {
        let count = segments.len();
        let mut remaining = trench_length;
        for (k, seg) in segments.iter().enumerate() {
            let k1 = k + 1;
            let offset = seg.offset.max(0.0);
            let raw_len = seg.length.unwrap_or(0.0);
            let seg_len = if k1 < count && raw_len > 0.0 {
                raw_len.min(remaining.max(0.0))
            } else {
                remaining.max(0.0)
            };

            let add_left = if k1 == 1 && left_free { offset } else { 0.0 };
            let add_right = if k1 == count && right_free { offset } else { 0.0 };
            let length_adj = seg_len + add_left + add_right;
            let width_adj = trench_width + 2.0 * offset;

            let mut text = format!(
                "Oberfläche {n}.{k1}: Randzone={} m  l={} m  b={} m",
                fmt_m(offset),
                fmt_m(length_adj),
                fmt_m(width_adj)
            );
            if !seg.material.is_empty() {
                text.push_str(&format!("  Material={}", seg.material));
            }
            self.push(Category::Surface, n, k1, text);

            remaining = (remaining - seg_len).max(0.0);
        }
    }

    /// Final survey text: generated lines in canonical order, or the manual
    /// override verbatim with any missing generated lines appended.
    pub fn into_text(self, manual: Option<&[String]>) -> String {
        let mut ordered: Vec<(Category, usize, usize, usize, String)> = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(pos, l)| (l.category, l.index, l.sub, pos, l.text))
            .collect();
        ordered.sort_by(|a, b| (a.0, a.1, a.2, a.3).cmp(&(b.0, b.1, b.2, b.3)));
        let auto: Vec<String> = ordered.into_iter().map(|(_, _, _, _, t)| t).collect();

        match manual {
            Some(lines) if !lines.is_empty() => {
                let base: Vec<String> = lines
                    .iter()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                let extras: Vec<String> =
                    auto.into_iter().filter(|l| !base.contains(l)).collect();
                base.into_iter().chain(extras).collect::<Vec<_>>().join("\n")
            }
            _ => auto.join("\n"),
        }
    }
}
