use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    default_level, default_period_length, CycleRecord, FlowIntensity, ImportBundle, MoodRecord,
    Severity, SymptomCategory, SymptomRecord,
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not parse {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a raw export payload into JSON, naming the offending file on
/// failure. CSV tokenization is the caller's job; a tokenized row list
/// enters through [`normalize_rows`].
pub fn parse_payload(raw: &str, source_name: &str) -> Result<Value, ImportError> {
    serde_json::from_str(raw).map_err(|source| ImportError::Parse {
        source_name: source_name.to_string(),
        source,
    })
}

/// Which known export shape an input matched. Dispatch is ordered; the
/// first matching rule wins and later rules are never consulted.
enum Shape<'a> {
    /// Already-canonical bundle (has `cycles`, `symptoms` or `moods`).
    Canonical(&'a Map<String, Value>),
    /// Flo-like export (`periods` / `mood_tracking`).
    Flo(&'a Map<String, Value>),
    /// A bare array is taken as the cycles list verbatim.
    BareArray,
    /// Clue-like export (`export_date` / `user_id` markers).
    Clue(&'a Map<String, Value>),
    /// Generic key substring scan over an unknown object.
    KeyScan(&'a Map<String, Value>),
    /// Nothing matched; degrade to an empty bundle rather than failing,
    /// so a partial import is never blocked outright.
    Unrecognized,
}

impl Shape<'_> {
    fn name(&self) -> &'static str {
        match self {
            Shape::Canonical(_) => "canonical",
            Shape::Flo(_) => "flo",
            Shape::BareArray => "bare-array",
            Shape::Clue(_) => "clue",
            Shape::KeyScan(_) => "key-scan",
            Shape::Unrecognized => "unrecognized",
        }
    }
}

fn detect_shape(value: &Value) -> Shape<'_> {
    if let Some(obj) = value.as_object() {
        if ["cycles", "symptoms", "moods"].iter().any(|k| obj.contains_key(*k)) {
            return Shape::Canonical(obj);
        }
        if obj.contains_key("periods") || obj.contains_key("mood_tracking") {
            return Shape::Flo(obj);
        }
    }
    if value.is_array() {
        return Shape::BareArray;
    }
    if let Some(obj) = value.as_object() {
        if obj.contains_key("export_date") || obj.contains_key("user_id") {
            return Shape::Clue(obj);
        }
        return Shape::KeyScan(obj);
    }
    Shape::Unrecognized
}

/// Ordered candidate field names per destination, one table per source
/// shape. Every destination takes the first defined candidate and falls
/// back to a fixed default, so precedence lives in one place.
struct CycleFields {
    /// Source id candidates; a fresh id is minted when none parse.
    id: &'static [&'static str],
    start: &'static [&'static str],
    cycle_length: &'static [&'static str],
    period_length: &'static [&'static str],
    flow: &'static [&'static str],
    notes: &'static [&'static str],
}

struct SymptomFields {
    date: &'static [&'static str],
    name: &'static [&'static str],
    category: &'static [&'static str],
    severity: &'static [&'static str],
    /// Textual severity assumed when the source omits one entirely.
    severity_default: Option<&'static str>,
    notes: &'static [&'static str],
}

struct MoodFields {
    date: &'static [&'static str],
    mood: &'static [&'static str],
    energy: &'static [&'static str],
    stress: &'static [&'static str],
    sleep: &'static [&'static str],
    notes: &'static [&'static str],
}

const CANONICAL_CYCLE: CycleFields = CycleFields {
    id: &["id"],
    start: &["start_date", "startDate"],
    cycle_length: &["cycle_length_days", "cycleLengthDays"],
    period_length: &["period_length_days", "periodLengthDays"],
    flow: &["flow_intensity", "flowIntensity"],
    notes: &["notes"],
};

const CANONICAL_SYMPTOM: SymptomFields = SymptomFields {
    date: &["date"],
    name: &["name", "symptom_name", "symptomName", "symptom_id"],
    category: &["category"],
    severity: &["severity"],
    severity_default: None,
    notes: &["notes"],
};

const CANONICAL_MOOD: MoodFields = MoodFields {
    date: &["date"],
    mood: &["mood", "mood_label", "moodLabel"],
    energy: &["energy_level", "energyLevel"],
    stress: &["stress_level", "stressLevel"],
    sleep: &["sleep_quality", "sleepQuality"],
    notes: &["notes"],
};

const FLO_CYCLE: CycleFields = CycleFields {
    id: &[],
    start: &["start_date"],
    cycle_length: &[],
    period_length: &["duration"],
    flow: &["intensity"],
    notes: &["notes"],
};

const FLO_SYMPTOM: SymptomFields = SymptomFields {
    date: &["date"],
    name: &["type", "name"],
    category: &["category"],
    severity: &["intensity"],
    severity_default: Some("mild"),
    notes: &["notes"],
};

const FLO_MOOD: MoodFields = MoodFields {
    date: &["date"],
    mood: &["mood"],
    energy: &["energy"],
    stress: &["stress"],
    sleep: &[],
    notes: &["notes"],
};

const CLUE_CYCLE: CycleFields = CycleFields {
    id: &[],
    start: &["start_date", "date"],
    cycle_length: &["length"],
    period_length: &["bleeding_days"],
    flow: &["flow"],
    notes: &["notes"],
};

const CLUE_SYMPTOM: SymptomFields = SymptomFields {
    date: &["date"],
    name: &["name"],
    category: &["category"],
    severity: &["severity"],
    severity_default: None,
    notes: &["notes"],
};

const CLUE_MOOD: MoodFields = MoodFields {
    date: &["date"],
    mood: &["mood"],
    energy: &["energy"],
    stress: &["stress"],
    sleep: &["sleep_quality"],
    notes: &["notes"],
};

/// Union of all known shapes, used for bare arrays and key-scan hits where
/// the source shape is unknown.
const ANY_CYCLE: CycleFields = CycleFields {
    id: &["id"],
    start: &["start_date", "startDate", "date"],
    cycle_length: &["cycle_length_days", "cycleLengthDays", "length"],
    period_length: &["period_length_days", "periodLengthDays", "duration", "bleeding_days"],
    flow: &["flow_intensity", "flowIntensity", "intensity", "flow"],
    notes: &["notes"],
};

const ANY_SYMPTOM: SymptomFields = SymptomFields {
    date: &["date"],
    name: &["name", "symptom_name", "symptomName", "symptom_id", "type"],
    category: &["category"],
    severity: &["severity", "intensity"],
    severity_default: None,
    notes: &["notes"],
};

const ANY_MOOD: MoodFields = MoodFields {
    date: &["date"],
    mood: &["mood", "mood_label", "moodLabel"],
    energy: &["energy_level", "energyLevel", "energy"],
    stress: &["stress_level", "stressLevel", "stress"],
    sleep: &["sleep_quality", "sleepQuality"],
    notes: &["notes"],
};

/// First defined, non-null candidate value.
fn pick<'a>(map: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn pick_str(map: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    pick(map, candidates)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn pick_date(map: &Map<String, Value>, candidates: &[&str]) -> Option<NaiveDate> {
    let raw = pick(map, candidates)?.as_str()?;
    parse_date(raw)
}

/// Accepts plain `YYYY-MM-DD` or the date prefix of an ISO timestamp.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// 1-10 scale value with the shared default of 5.
fn pick_level(map: &Map<String, Value>, candidates: &[&str]) -> u8 {
    pick(map, candidates)
        .and_then(Value::as_f64)
        .map(|v| (v.round() as i64).clamp(1, 10) as u8)
        .unwrap_or_else(default_level)
}

fn pick_severity(map: &Map<String, Value>, fields: &SymptomFields) -> Severity {
    match pick(map, fields.severity) {
        Some(Value::Number(n)) => {
            let raw = n
                .as_i64()
                .unwrap_or_else(|| n.as_f64().map_or(5.0, f64::round) as i64);
            Severity::Scale(raw)
        }
        Some(Value::String(s)) => Severity::Text(s.clone()),
        _ => match fields.severity_default {
            Some(text) => Severity::Text(text.to_string()),
            None => Severity::default(),
        },
    }
}

/// Records without a parseable date are skipped; every other field
/// defaults per the shape table.
fn cycle_from(map: &Map<String, Value>, fields: &CycleFields) -> Option<CycleRecord> {
    let start_date = pick_date(map, fields.start)?;
    Some(CycleRecord {
        id: pick_str(map, fields.id)
            .and_then(|s| Uuid::parse_str(&s).ok())
            .unwrap_or_else(Uuid::new_v4),
        start_date,
        cycle_length_days: pick(map, fields.cycle_length).and_then(Value::as_i64),
        period_length_days: pick(map, fields.period_length)
            .and_then(Value::as_i64)
            .unwrap_or_else(default_period_length),
        flow_intensity: pick_str(map, fields.flow)
            .map(|s| FlowIntensity::from_label(&s))
            .unwrap_or_default(),
        notes: pick_str(map, fields.notes).unwrap_or_default(),
    })
}

fn symptom_from(map: &Map<String, Value>, fields: &SymptomFields) -> Option<SymptomRecord> {
    let date = pick_date(map, fields.date)?;
    Some(SymptomRecord {
        date,
        name: pick_str(map, fields.name).unwrap_or_default(),
        category: pick_str(map, fields.category)
            .map(|s| SymptomCategory::from_label(&s))
            .unwrap_or_default(),
        severity: pick_severity(map, fields),
        notes: pick_str(map, fields.notes).unwrap_or_default(),
    })
}

fn mood_from(map: &Map<String, Value>, fields: &MoodFields) -> Option<MoodRecord> {
    let date = pick_date(map, fields.date)?;
    Some(MoodRecord {
        date,
        mood: pick_str(map, fields.mood).unwrap_or_else(|| "okay".to_string()),
        energy_level: pick_level(map, fields.energy),
        stress_level: pick_level(map, fields.stress),
        sleep_quality: pick_level(map, fields.sleep),
        notes: pick_str(map, fields.notes).unwrap_or_default(),
    })
}

fn map_list<T>(
    value: Option<&Value>,
    mut build: impl FnMut(&Map<String, Value>) -> Option<T>,
) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|m| build(m))
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize an arbitrary third-party export into the canonical bundle.
///
/// Never fails: an input matching no known shape yields three empty lists
/// (see [`Shape::Unrecognized`]), since a partial import beats a refused
/// one. Malformed payloads are caught earlier, in [`parse_payload`].
pub fn normalize(value: &Value) -> ImportBundle {
    let shape = detect_shape(value);
    debug!(shape = shape.name(), "matched import shape");

    match shape {
        Shape::Canonical(obj) => ImportBundle {
            cycles: map_list(obj.get("cycles"), |m| cycle_from(m, &CANONICAL_CYCLE)),
            symptoms: map_list(obj.get("symptoms"), |m| symptom_from(m, &CANONICAL_SYMPTOM)),
            moods: map_list(obj.get("moods"), |m| mood_from(m, &CANONICAL_MOOD)),
        },
        Shape::Flo(obj) => ImportBundle {
            cycles: map_list(obj.get("periods"), |m| cycle_from(m, &FLO_CYCLE)),
            symptoms: map_list(obj.get("symptoms"), |m| symptom_from(m, &FLO_SYMPTOM)),
            moods: map_list(obj.get("mood_tracking"), |m| mood_from(m, &FLO_MOOD)),
        },
        Shape::BareArray => ImportBundle {
            cycles: map_list(Some(value), |m| cycle_from(m, &ANY_CYCLE)),
            symptoms: Vec::new(),
            moods: Vec::new(),
        },
        Shape::Clue(obj) => {
            // Clue-like exports nest their lists under `data`; older dumps
            // put them at the top level.
            let data = obj.get("data").and_then(Value::as_object).unwrap_or(obj);
            ImportBundle {
                cycles: map_list(data.get("cycles"), |m| cycle_from(m, &CLUE_CYCLE)),
                symptoms: map_list(data.get("symptoms"), |m| symptom_from(m, &CLUE_SYMPTOM)),
                moods: map_list(data.get("moods"), |m| mood_from(m, &CLUE_MOOD)),
            }
        }
        Shape::KeyScan(obj) => {
            let mut bundle = ImportBundle::default();
            for (key, entry) in obj {
                if !entry.is_array() {
                    continue;
                }
                let key = key.to_lowercase();
                if key.contains("cycle") || key.contains("period") {
                    bundle
                        .cycles
                        .extend(map_list(Some(entry), |m| cycle_from(m, &ANY_CYCLE)));
                } else if key.contains("symptom") {
                    bundle
                        .symptoms
                        .extend(map_list(Some(entry), |m| symptom_from(m, &ANY_SYMPTOM)));
                } else if key.contains("mood") {
                    bundle
                        .moods
                        .extend(map_list(Some(entry), |m| mood_from(m, &ANY_MOOD)));
                }
            }
            bundle
        }
        Shape::Unrecognized => ImportBundle::default(),
    }
}

/// Treat an already-tokenized CSV row list as a bare-array import.
pub fn normalize_rows(rows: Vec<Value>) -> ImportBundle {
    normalize(&Value::Array(rows))
}
