//! End-to-end flows: long overlapping event series are streamlined one by
//! one into a timeline that must come out sorted and pairwise disjoint,
//! across record shapes and field names.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use timefit::{
    Direction, FieldBinding, FitError, Record, Streamliner, TimeRange, TimeValue, Timestamp,
    ordered_insert, streamline_event,
};

/// Deterministic pseudo-random sequence; keeps the series reproducible.
struct Lcg(u64);

impl Lcg {
    #[allow(clippy::cast_possible_wrap)]
    fn next_in(&mut self, bound: i64) -> i64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as i64) % bound
    }
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid base timestamp")
}

/// Overlapping event series: starts strictly increase, stops routinely run
/// past the next few starts.
fn series(count: usize, seed: u64) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut rng = Lcg(seed);
    let mut start = base();
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let stop = start + Duration::minutes(1 + rng.next_in(2_000));
        out.push((start, stop));
        start += Duration::minutes(1 + rng.next_in(1_500));
    }
    out
}

fn assert_disjoint_and_sorted(pairs: &[(Timestamp, Timestamp)]) {
    assert!(!pairs.is_empty());
    for window in pairs.windows(2) {
        let (_, prev_stop) = window[0];
        let (next_start, _) = window[1];
        assert!(
            prev_stop <= next_start,
            "timeline entries overlap or are unsorted"
        );
    }
    for (start, stop) in pairs {
        assert!(start < stop, "empty entry survived streamlining");
    }
}

#[test]
fn json_series_streamlines_into_a_disjoint_timeline() {
    let mut finished = Vec::new();
    for (start, stop) in series(500, 7) {
        let candidate = json!({"start": start.to_rfc3339(), "stop": stop.to_rfc3339()});
        match streamline_event(candidate, &finished) {
            Ok(adjusted) => finished.push(adjusted),
            Err(FitError::NoRoom) => {}
            Err(other) => panic!("unexpected fit error: {other}"),
        }
    }
    let pairs = timefit::time_ranges(&finished).unwrap();
    assert_eq!(pairs.len(), finished.len());
    assert_disjoint_and_sorted(&pairs);
}

struct Entry {
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
}

impl Record for Entry {
    fn field(&self, name: &str) -> Option<TimeValue> {
        match name {
            "start" => Some(self.start.into()),
            "stop" => Some(self.stop.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: &Timestamp) -> bool {
        let Some(instant) = value.to_utc() else {
            return false;
        };
        match name {
            "start" => self.start = instant,
            "stop" => self.stop = instant,
            _ => return false,
        }
        true
    }
}

#[test]
fn struct_series_matches_the_json_flow() {
    let tm = Streamliner::new();
    let mut structs = Vec::new();
    let mut jsons = Vec::new();
    for (start, stop) in series(300, 11) {
        match tm.streamline(Entry { start, stop }, &structs, &[]) {
            Ok(adjusted) => structs.push(adjusted),
            Err(FitError::NoRoom) => {}
            Err(other) => panic!("unexpected fit error: {other}"),
        }
        let candidate = json!({"start": start.to_rfc3339(), "stop": stop.to_rfc3339()});
        match streamline_event(candidate, &jsons) {
            Ok(adjusted) => jsons.push(adjusted),
            Err(FitError::NoRoom) => {}
            Err(other) => panic!("unexpected fit error: {other}"),
        }
    }
    let struct_pairs = tm.time_ranges(&structs).unwrap();
    let json_pairs = timefit::time_ranges(&jsons).unwrap();
    assert_eq!(struct_pairs, json_pairs);
    assert_disjoint_and_sorted(&struct_pairs);
}

#[test]
fn renamed_fields_follow_the_same_flow() {
    let tm = Streamliner::with_fields("begin", "end");
    let mut finished = Vec::new();
    for (start, stop) in series(300, 11) {
        let candidate = json!({"begin": start.to_rfc3339(), "end": stop.to_rfc3339()});
        match tm.streamline(candidate, &finished, &[]) {
            Ok(adjusted) => finished.push(adjusted),
            Err(FitError::NoRoom) => {}
            Err(other) => panic!("unexpected fit error: {other}"),
        }
    }
    let pairs = tm.time_ranges(&finished).unwrap();
    assert_disjoint_and_sorted(&pairs);
}

#[test]
fn occlusions_keep_their_window_clear() {
    let tm = Streamliner::new();
    let window = TimeRange::new(base() + Duration::days(3), base() + Duration::days(4)).unwrap();
    let occlusions = vec![window];
    let mut finished = Vec::new();
    for (start, stop) in series(200, 13) {
        let candidate = json!({"start": start.to_rfc3339(), "stop": stop.to_rfc3339()});
        match tm.streamline(candidate, &finished, &occlusions) {
            Ok(adjusted) => finished.push(adjusted),
            Err(FitError::NoRoom) => {}
            Err(other) => panic!("unexpected fit error: {other}"),
        }
    }
    for (start, stop) in tm.time_ranges(&finished).unwrap() {
        let clear = stop <= window.start || window.stop <= start;
        assert!(clear, "streamlined event overlaps an occlusion");
    }
}

#[test]
fn threaded_inserts_build_the_same_timeline_as_reset_inserts() {
    let events: Vec<serde_json::Value> = series(200, 17)
        .into_iter()
        .map(|(start, stop)| json!({"start": start.to_rfc3339(), "stop": stop.to_rfc3339()}))
        .collect();
    let key = FieldBinding::named("start");

    let mut threaded = Vec::new();
    let mut offset = 0;
    let mut steps = 0;
    for event in events.clone() {
        let outcome = ordered_insert(
            &mut threaded,
            event,
            &key,
            Direction::Ascending,
            offset,
            None,
        )
        .unwrap();
        steps += outcome.position - offset;
        offset = outcome.offset;
    }
    assert!(
        steps <= events.len(),
        "threaded offsets should scan linearly overall"
    );

    let mut reset = Vec::new();
    for event in events {
        ordered_insert(&mut reset, event, &key, Direction::Ascending, 0, None).unwrap();
    }
    assert_eq!(threaded, reset);

    let pairs = timefit::time_ranges(&threaded).unwrap();
    for window in pairs.windows(2) {
        assert!(window[0].0 <= window[1].0, "insertion order broke sorting");
    }
}

#[test]
fn descending_inserts_mirror_ascending_ones() {
    let events: Vec<serde_json::Value> = series(100, 19)
        .into_iter()
        .rev()
        .map(|(start, stop)| json!({"start": start.to_rfc3339(), "stop": stop.to_rfc3339()}))
        .collect();
    let tm = Streamliner::new().direction(Direction::Descending);

    let mut timeline = Vec::new();
    let mut offset = 0;
    for event in events {
        let outcome = tm.insert(&mut timeline, event, offset).unwrap();
        offset = outcome.offset;
    }
    let pairs = timefit::time_ranges(&timeline).unwrap();
    for window in pairs.windows(2) {
        assert!(window[0].0 >= window[1].0, "descending order broke");
    }
}

#[test]
fn fit_results_serve_as_sort_keys() {
    let tm = Streamliner::new();
    let mut ranges: Vec<TimeRange> = series(50, 23)
        .into_iter()
        .map(|(start, stop)| {
            let candidate = json!({"start": start.to_rfc3339(), "stop": stop.to_rfc3339()});
            tm.streamline_times(&candidate, &[], &[]).unwrap()
        })
        .collect();
    ranges.sort_by(|a, b| a.partial_cmp(b).expect("uniformly aware ranges"));
    for window in ranges.windows(2) {
        assert!(window[0] <= window[1]);
    }
}
