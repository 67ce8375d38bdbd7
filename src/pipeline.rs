//! Filter & Group, then Select & Clean.
//!
//! Both stages are pure transformations; the group list is handed from one to
//! the other by value.

use std::time::Instant;

use crate::models::{CanonicalRecord, Group, GroupIndex, PipelineStats, RawRecord};
use crate::normalize::{clean_lyrics, exclusion_reason, normalize_title, Exclusion};

// ============================================================================
// Filter & Group
// ============================================================================

/// Drop excluded records and bucket the rest by normalized title.
/// Groups come back in the order their key was first seen.
pub fn filter_and_group(records: &[RawRecord], stats: &mut PipelineStats) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index = GroupIndex::default();

    stats.input_records += records.len();

    for record in records {
        match exclusion_reason(&record.title, &record.lyrics) {
            Some(Exclusion::JordanLakeSession) => {
                stats.excluded_jordan_lake += 1;
                continue;
            }
            Some(Exclusion::Instrumental) => {
                stats.excluded_instrumental += 1;
                continue;
            }
            None => {}
        }

        let key = normalize_title(&record.title);
        match index.get(&key) {
            Some(&idx) => groups[idx].records.push(record.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    records: vec![record.clone()],
                });
            }
        }
    }

    stats.groups += groups.len();
    groups
}

// ============================================================================
// Select & Clean
// ============================================================================

/// Pick the record with the shortest title (in characters).
/// Ties go to the earliest record in the group.
pub fn select_representative(records: &[RawRecord]) -> Option<&RawRecord> {
    // min_by_key returns the first of equal minimums
    records.iter().min_by_key(|r| r.title.chars().count())
}

/// Select one record from the group and clean its lyrics.
/// Returns None when the cleaned lyrics are empty.
pub fn select_and_clean(group: &Group) -> Option<CanonicalRecord> {
    let selected = select_representative(&group.records)?;
    let lyrics = clean_lyrics(&selected.lyrics);
    if lyrics.is_empty() {
        return None;
    }
    Some(CanonicalRecord {
        title: selected.title.clone(),
        lyrics,
    })
}

/// Run Select & Clean over every group, in group order.
pub fn clean_groups(groups: &[Group], stats: &mut PipelineStats) -> Vec<CanonicalRecord> {
    let mut canonical = Vec::with_capacity(groups.len());
    for group in groups {
        stats.merged_variants += group.records.len().saturating_sub(1);
        match select_and_clean(group) {
            Some(record) => canonical.push(record),
            None => stats.dropped_empty_lyrics += 1,
        }
    }
    stats.canonical_records += canonical.len();
    canonical
}

/// Full canonicalization run: raw records in, canonical dataset and stats out.
pub fn canonicalize(records: &[RawRecord]) -> (Vec<CanonicalRecord>, PipelineStats) {
    let start = Instant::now();
    let mut stats = PipelineStats::default();

    let groups = filter_and_group(records, &mut stats);
    let canonical = clean_groups(&groups, &mut stats);

    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    (canonical, stats)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, lyrics: &str) -> RawRecord {
        RawRecord::new(title, lyrics)
    }

    #[test]
    fn test_grouping_merges_variants() {
        let records = vec![
            rec("This Year", "a"),
            rec("No Children", "b"),
            rec("This Year (Live)", "c"),
            rec("No Children (Demo)", "d"),
            rec("Cotton", "e"),
        ];
        let mut stats = PipelineStats::default();
        let groups = filter_and_group(&records, &mut stats);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["This Year", "No Children", "Cotton"]);
        assert_eq!(groups[0].records, vec![rec("This Year", "a"), rec("This Year (Live)", "c")]);
        assert_eq!(stats.groups, 3);
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let records = vec![
            rec("A", "1"),
            rec("A (Live)", "2"),
            rec("Jordan Lake Sessions 4", "3"),
            rec("B", "4"),
            rec("C", "ContributorsThis song is an instrumental"),
            rec("B - Live", "5"),
            rec("A (Acoustic)", "6"),
        ];
        let mut stats = PipelineStats::default();
        let groups = filter_and_group(&records, &mut stats);

        let mut flattened: Vec<RawRecord> =
            groups.iter().flat_map(|g| g.records.iter().cloned()).collect();
        let mut expected: Vec<RawRecord> = records
            .iter()
            .filter(|r| exclusion_reason(&r.title, &r.lyrics).is_none())
            .cloned()
            .collect();
        flattened.sort_by(|a, b| a.lyrics.cmp(&b.lyrics));
        expected.sort_by(|a, b| a.lyrics.cmp(&b.lyrics));

        assert_eq!(flattened, expected);
        assert!(groups.iter().all(|g| !g.records.is_empty()));
        assert_eq!(stats.grouped_records(), expected.len());
    }

    #[test]
    fn test_excluded_records_never_grouped() {
        let records = vec![
            rec("Jordan Lake Sessions 4", "Lyrics\nwords"),
            rec("Song", "1 ContributorsThis song is an instrumental"),
            rec("Kept", "Lyrics\nwords"),
        ];
        let mut stats = PipelineStats::default();
        let groups = filter_and_group(&records, &mut stats);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].records[0].title, "Kept");
        assert_eq!(stats.excluded_jordan_lake, 1);
        assert_eq!(stats.excluded_instrumental, 1);
    }

    #[test]
    fn test_select_shortest_title() {
        let records = vec![rec("Song (Live)", "a"), rec("Song", "b"), rec("Song (Demo)", "c")];
        assert_eq!(select_representative(&records).unwrap().title, "Song");
    }

    #[test]
    fn test_select_tie_keeps_first() {
        let records = vec![rec("Song (Live)", "first"), rec("Song (Demo)", "second")];
        assert_eq!(select_representative(&records).unwrap().lyrics, "first");

        let records = vec![rec("Long title", "x"), rec("Abc", "first"), rec("Xyz", "second")];
        assert_eq!(select_representative(&records).unwrap().lyrics, "first");
    }

    #[test]
    fn test_select_counts_characters_not_bytes() {
        // "Été" is 3 chars but 5 bytes
        let records = vec![rec("Abcd", "bytes"), rec("Été", "chars")];
        assert_eq!(select_representative(&records).unwrap().lyrics, "chars");
    }

    #[test]
    fn test_select_empty_group() {
        assert!(select_representative(&[]).is_none());
    }

    #[test]
    fn test_clean_groups_tolerates_empty_group() {
        let groups = vec![Group {
            key: "k".to_string(),
            records: vec![],
        }];
        let mut stats = PipelineStats::default();
        assert!(clean_groups(&groups, &mut stats).is_empty());
        assert_eq!(stats.merged_variants, 0);
        assert_eq!(stats.dropped_empty_lyrics, 1);
    }

    #[test]
    fn test_select_and_clean_keeps_original_title() {
        let group = Group {
            key: "Song".to_string(),
            records: vec![rec("Song (Live)", "Song Lyrics\nlive"), rec("Song", "Song Lyrics\nstudio")],
        };
        assert_eq!(
            select_and_clean(&group),
            Some(CanonicalRecord {
                title: "Song".to_string(),
                lyrics: vec!["studio".to_string()],
            })
        );
    }

    #[test]
    fn test_empty_lyrics_dropped() {
        let (canonical, stats) = canonicalize(&[rec("Interlude", "[Instrumental]")]);
        assert!(canonical.is_empty());
        assert_eq!(stats.dropped_empty_lyrics, 1);
    }

    #[test]
    fn test_selected_empty_is_not_replaced_by_longer_variant() {
        // The shortest title wins even if a longer variant has lyrics
        let (canonical, _) = canonicalize(&[
            rec("Song", "[Instrumental]"),
            rec("Song (Live)", "Song Lyrics\nwords"),
        ]);
        assert!(canonical.is_empty());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let records = vec![
            rec("No Children", "No Children LyricsI hope...\n[Verse]\nSecond line\nEmbed"),
            rec("No Children (Live)", "..."),
        ];
        let (canonical, stats) = canonicalize(&records);

        assert_eq!(
            canonical,
            vec![CanonicalRecord {
                title: "No Children".to_string(),
                lyrics: vec!["I hope...".to_string(), "Second line".to_string()],
            }]
        );
        assert_eq!(stats.input_records, 2);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.merged_variants, 1);
        assert_eq!(stats.canonical_records, 1);
    }

    #[test]
    fn test_stats_add_up() {
        let records = vec![
            rec("A", "A Lyrics\none"),
            rec("A (Live)", "A Lyrics\ntwo"),
            rec("B", "[Instrumental]"),
            rec("Jordan Lake Sessions 1", "x"),
            rec("C", "ContributorsThis song is an instrumental"),
            rec("D - Live", "D Lyrics\nthree"),
        ];
        let (canonical, stats) = canonicalize(&records);

        assert_eq!(stats.input_records, 6);
        assert_eq!(stats.excluded(), 2);
        assert_eq!(stats.groups, 3);
        assert_eq!(stats.merged_variants, 1);
        assert_eq!(stats.dropped_empty_lyrics, 1);
        assert_eq!(stats.canonical_records, canonical.len());
        assert_eq!(canonical.len(), 2);
        assert_eq!(
            stats.groups,
            stats.canonical_records + stats.dropped_empty_lyrics
        );
        assert_eq!(canonical[1].title, "D - Live");
    }

    #[test]
    fn test_canonicalize_deterministic() {
        let records = vec![
            rec("Z", "Z Lyrics\nz"),
            rec("Y (Demo)", "Y Lyrics\ny"),
            rec("X", "X Lyrics\nx"),
            rec("Y", "Y Lyrics\nyy"),
        ];
        let (first, _) = canonicalize(&records);
        let (second, _) = canonicalize(&records);
        assert_eq!(first, second);
        let titles: Vec<&str> = first.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Z", "Y", "X"]);
    }
}
