use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::services::vocab::VocabEntry;

pub const MASTERY_THRESHOLD: i32 = 3;

/// Net correct review answers per headword.
///
/// Counts have no lower bound: repeated misses keep pushing a word further down, which
/// only matters for review pool priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasteryMap {
    counts: HashMap<String, i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryChange {
    pub before: i32,
    pub after: i32,
    pub newly_mastered: bool,
}

impl MasteryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, headword: &str) -> i32 {
        self.counts.get(headword).copied().unwrap_or(0)
    }

    pub fn is_mastered(&self, headword: &str) -> bool {
        self.count(headword) >= MASTERY_THRESHOLD
    }

    pub fn record(&mut self, headword: &str, correct: bool) -> MasteryChange {
        let count = self.counts.entry(headword.to_string()).or_insert(0);
        let before = *count;
        *count = if correct {
            before.saturating_add(1)
        } else {
            before.saturating_sub(1)
        };
        let after = *count;

        MasteryChange {
            before,
            after,
            newly_mastered: before < MASTERY_THRESHOLD && after >= MASTERY_THRESHOLD,
        }
    }

    /// Headwords in `entries` that are mastered.
    pub fn mastered_in<'a>(&self, entries: &'a [VocabEntry]) -> BTreeSet<&'a str> {
        entries
            .iter()
            .map(|e| e.headword.as_str())
            .filter(|h| self.is_mastered(h))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastered_exactly_when_count_first_reaches_threshold() {
        let mut map = MasteryMap::new();
        assert!(!map.record("猫", true).newly_mastered);
        assert!(!map.record("猫", true).newly_mastered);
        let third = map.record("猫", true);
        assert!(third.newly_mastered);
        assert_eq!(third.after, 3);
        assert!(!map.record("猫", true).newly_mastered);
        assert!(map.is_mastered("猫"));
    }

    #[test]
    fn misses_go_negative() {
        let mut map = MasteryMap::new();
        map.record("犬", false);
        let change = map.record("犬", false);
        assert_eq!(change, MasteryChange { before: -1, after: -2, newly_mastered: false });
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut map = MasteryMap::new();
        map.record("家族", true);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"家族":1}"#);

        let back: MasteryMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.count("家族"), 1);
    }

    #[test]
    fn mastered_in_filters_by_list() {
        let mut map = MasteryMap::new();
        for _ in 0..3 {
            map.record("家族", true);
            map.record("外", true);
        }
        let entries = vec![
            VocabEntry::new("家族", "かぞく", "家人", "N5"),
            VocabEntry::new("先生", "せんせい", "老師", "N5"),
        ];
        let mastered = map.mastered_in(&entries);
        assert_eq!(mastered.into_iter().collect::<Vec<_>>(), vec!["家族"]);
    }
}
