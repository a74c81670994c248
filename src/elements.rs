//! Typed element model and ingestion.
//!
//! The element-list producer hands the engine a flat, dynamically-typed
//! sequence of key/value maps addressed by a German type-discriminator
//! string ("Baugraben", "Rohr", "Oberflächenbefestigung", "Durchstich",
//! "Verbindung"). Classification happens exactly once, here, into a closed
//! tagged union; the renderer never inspects type strings again.
//!
//! Numeric fields accept plain numbers as well as the string spellings the
//! session layer lets through: comma decimal separators, `mm`/`cm`/`m`
//! suffixes, and `DN150`-style nominal diameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Excavation trench ("Baugraben").
///
/// `depth` is the reference depth; `depth_left`/`depth_right` describe a
/// sloped floor and default to `depth` when absent. `gok` shifts this
/// trench's elevation baseline relative to the shared ceiling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrenchSpec {
    #[serde(default)]
    pub trench_index: usize,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub depth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_right: Option<f64>,
    #[serde(default)]
    pub gok: f64,
}

impl TrenchSpec {
    /// Resolved `(reference, left, right)` depths; missing sides default to
    /// `depth`, the reference is the maximum of all three.
    pub fn depths(&self) -> (f64, f64, f64) {
        let d_left = self.depth_left.unwrap_or(self.depth);
        let d_right = self.depth_right.unwrap_or(self.depth);
        (self.depth.max(d_left).max(d_right), d_left, d_right)
    }
}

/// Pipe ("Rohr") owned by a trench.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipeSpec {
    #[serde(default)]
    pub for_trench: usize,
    #[serde(default)]
    pub diameter: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default)]
    pub full_span: bool,
    #[serde(default)]
    pub offset: f64,
}

impl PipeSpec {
    /// A pipe without an explicit positive length spans the full trench.
    pub fn wants_full_span(&self) -> bool {
        self.full_span || self.length.unwrap_or(0.0) <= 0.0
    }
}

/// Surface-restoration segment ("Oberflächenbefestigung").
///
/// `offset` is the border zone (Randzone) around the plan footprint; a
/// missing `length` means "consume the remaining trench length".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSpec {
    #[serde(default)]
    pub for_trench: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<usize>,
    #[serde(default)]
    pub offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default)]
    pub material: String,
}

/// Passage ("Durchstich") between trench `between` and `between + 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Plain connection ("Verbindung") between adjacent trenches.
///
/// Either a single seam (`between`) or a list of consecutive trench
/// numbers (`group`) that the normalizer expands into pairwise seams.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<usize>,
}

/// Manually edited quantity-survey lines; the youngest override wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AufmassOverride {
    #[serde(default)]
    pub lines: Vec<String>,
}

/// A classified construction element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Element {
    #[serde(rename = "Baugraben")]
    Trench(TrenchSpec),
    #[serde(rename = "Rohr")]
    Pipe(PipeSpec),
    #[serde(rename = "Oberflächenbefestigung")]
    Surface(SurfaceSpec),
    #[serde(rename = "Durchstich")]
    Passage(PassageSpec),
    #[serde(rename = "Verbindung")]
    Connection(ConnectionSpec),
    #[serde(rename = "aufmass_override")]
    AufmassOverride(AufmassOverride),
}

impl Element {
    /// Classify one dynamically-typed map. Returns `None` for unknown or
    /// non-drawable types (e.g. a stored "aufmass" result block).
    pub fn from_value(value: &Value) -> Option<Element> {
        let kind = fold_type(value.get("type")?.as_str()?);

        if kind == "aufmass_override" {
            let lines = value
                .get("lines")
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            return Some(Element::AufmassOverride(AufmassOverride { lines }));
        }
        if kind == "aufmass" {
            return None;
        }

        if kind.contains("baugraben") {
            let depth = meters_field(value, "depth").unwrap_or(0.0);
            return Some(Element::Trench(TrenchSpec {
                trench_index: index_field(value, "trench_index"),
                length: meters_field(value, "length").unwrap_or(0.0),
                width: meters_field(value, "width").unwrap_or(0.0),
                depth,
                depth_left: meters_field(value, "depth_left"),
                depth_right: meters_field(value, "depth_right"),
                gok: meters_field(value, "gok").unwrap_or(0.0),
            }));
        }
        if kind.contains("rohr") {
            return Some(Element::Pipe(PipeSpec {
                for_trench: index_field(value, "for_trench"),
                diameter: meters_field(value, "diameter").unwrap_or(0.0),
                length: meters_field(value, "length"),
                full_span: truthy_field(value, "full_span"),
                offset: meters_field(value, "offset").unwrap_or(0.0),
            }));
        }
        if kind.contains("oberflaechenbefest") {
            return Some(Element::Surface(SurfaceSpec {
                for_trench: index_field(value, "for_trench"),
                seq: opt_index_field(value, "seq"),
                offset: meters_field(value, "offset").unwrap_or(0.0),
                length: meters_field(value, "length"),
                material: value
                    .get("material")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            }));
        }
        if kind.contains("durchstich") {
            return Some(Element::Passage(PassageSpec {
                between: opt_index_field(value, "between"),
                length: meters_field(value, "length"),
                pattern: value
                    .get("pattern")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }));
        }
        if kind.contains("verbindung") {
            return Some(Element::Connection(ConnectionSpec {
                between: opt_index_field(value, "between"),
                group: value
                    .get("group")
                    .and_then(Value::as_array)
                    .map(|a| {
                        a.iter()
                            .filter_map(index_value)
                            .filter(|&g| g > 0)
                            .collect()
                    })
                    .unwrap_or_default(),
            }));
        }

        None
    }
}

/// Classify a flat value sequence; unknown entries are dropped.
pub fn parse_elements(values: &[Value]) -> Vec<Element> {
    values
        .iter()
        .filter_map(|v| {
            let parsed = Element::from_value(v);
            if parsed.is_none() {
                crate::log::debug!("dropping unclassifiable element: {v}");
            }
            parsed
        })
        .collect()
}

/// Lower-case a type string and fold umlauts so both spellings match.
fn fold_type(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('ß', "ss")
}

/// Read a length-like field in meters. Accepts numbers and the string
/// spellings "1,5", "90cm", "150 mm", "DN150" (nominal diameter → meters).
fn meters_field(value: &Value, key: &str) -> Option<f64> {
    meters(value.get(key)?)
}

fn meters(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    let s = v.as_str()?.trim().to_lowercase().replace(',', ".");
    if s.is_empty() {
        return None;
    }
    if let Some(rest) = s.strip_prefix("dn") {
        let digits: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return digits.parse::<f64>().ok().map(|d| d / 1000.0);
        }
    }
    let (number, unit) = split_unit(&s);
    let parsed: f64 = number.trim().parse().ok()?;
    Some(match unit {
        "mm" => parsed / 1000.0,
        "cm" => parsed / 100.0,
        _ => parsed,
    })
}

fn split_unit(s: &str) -> (&str, &str) {
    // "mm" must be tried before "m"
    for unit in ["mm", "cm", "m"] {
        if let Some(rest) = s.strip_suffix(unit) {
            return (rest, unit);
        }
    }
    (s, "")
}

fn index_value(v: &Value) -> Option<usize> {
    if let Some(n) = v.as_u64() {
        return Some(n as usize);
    }
    if let Some(f) = v.as_f64() {
        return if f >= 0.0 { Some(f as usize) } else { None };
    }
    v.as_str()?.trim().parse().ok()
}

fn index_field(value: &Value, key: &str) -> usize {
    value.get(key).and_then(index_value).unwrap_or(0)
}

fn opt_index_field(value: &Value, key: &str) -> Option<usize> {
    match value.get(key) {
        None | Some(Value::Null) => None,
        Some(v) => index_value(v),
    }
}

fn truthy_field(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => false,
    }
}
