//! Evidence values and the lookup capability consumed by the evaluator.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::Value;

/// Well-known evidence keys.
///
/// Trees may reference any key; these are the ones published data uses today.
pub mod keys {
    pub const SCREEN_WIDTH: &str = "screenwidth";
    pub const SCREEN_HEIGHT: &str = "screenheight";
    pub const SCREEN_RATIO: &str = "screenratio";
    pub const COLOR_GAMUT: &str = "colorgamut";
    pub const HASH_2D: &str = "hash2d";
    pub const HASH_3D: &str = "hash3d";
    pub const BENCHMARK_AVERAGE: &str = "benchmarkaverage";
    pub const BENCHMARK_STDDEV: &str = "benchmarkstddev";
    pub const GPU_FAMILY: &str = "gpufamily";
    pub const GPU_RENDERER: &str = "gpurenderer";

    pub const ALL: [&str; 10] = [
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        SCREEN_RATIO,
        COLOR_GAMUT,
        HASH_2D,
        HASH_3D,
        BENCHMARK_AVERAGE,
        BENCHMARK_STDDEV,
        GPU_FAMILY,
        GPU_RENDERER,
    ];
}

/// A single measured signal.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceValue {
    Text(String),
    Number(f64),
}

impl EvidenceValue {
    /// Text form used for literal comparison. `5.0` renders as `"5"`.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    /// Numeric form used for range comparison.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Bool(b) => Some(Self::Text(b.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for EvidenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for EvidenceValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for EvidenceValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for EvidenceValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for EvidenceValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for EvidenceValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

/// Evidence lookup capability: key in, optional value out.
///
/// A missing value is not an error; the evaluator skips whatever needs it.
pub trait EvidenceSource {
    fn evidence(&self, key: &str) -> Option<EvidenceValue>;
}

impl<T: EvidenceSource + ?Sized> EvidenceSource for &T {
    fn evidence(&self, key: &str) -> Option<EvidenceValue> {
        (**self).evidence(key)
    }
}

impl EvidenceSource for HashMap<String, String> {
    fn evidence(&self, key: &str) -> Option<EvidenceValue> {
        self.get(key).map(|v| EvidenceValue::Text(v.clone()))
    }
}

impl EvidenceSource for BTreeMap<String, String> {
    fn evidence(&self, key: &str) -> Option<EvidenceValue> {
        self.get(key).map(|v| EvidenceValue::Text(v.clone()))
    }
}

impl EvidenceSource for HashMap<String, EvidenceValue> {
    fn evidence(&self, key: &str) -> Option<EvidenceValue> {
        self.get(key).cloned()
    }
}

impl EvidenceSource for BTreeMap<String, EvidenceValue> {
    fn evidence(&self, key: &str) -> Option<EvidenceValue> {
        self.get(key).cloned()
    }
}

impl EvidenceSource for serde_json::Map<String, Value> {
    fn evidence(&self, key: &str) -> Option<EvidenceValue> {
        self.get(key).and_then(EvidenceValue::from_json)
    }
}

/// Adapter turning a closure into an [`EvidenceSource`].
pub struct FromFn<F>(F);

/// Wrap a lookup closure.
///
/// ```
/// use proftree::domain::{from_fn, EvidenceSource, EvidenceValue};
///
/// let lookup = from_fn(|key| (key == "screenwidth").then(|| EvidenceValue::Number(350.0)));
/// assert!(lookup.evidence("screenwidth").is_some());
/// assert!(lookup.evidence("hash3d").is_none());
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&str) -> Option<EvidenceValue>,
{
    FromFn(f)
}

impl<F> EvidenceSource for FromFn<F>
where
    F: Fn(&str) -> Option<EvidenceValue>,
{
    fn evidence(&self, key: &str) -> Option<EvidenceValue> {
        (self.0)(key)
    }
}

/// Parse `key=value` pairs into an evidence map.
///
/// Values stay textual so literals such as `007` survive intact; range nodes
/// parse them on demand. Later pairs overwrite earlier ones with the same key.
pub fn parse_pairs<I, S>(pairs: I) -> Result<BTreeMap<String, EvidenceValue>, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{pair}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty evidence key in '{pair}'"));
        }
        map.insert(key.to_string(), EvidenceValue::Text(value.to_string()));
    }
    Ok(map)
}
