//! Character level sequence matching.
//!
//! [`SequenceMatcher`] reproduces the longest-matching-block algorithm used by
//! `difflib`, including its auto-junk heuristic for long sequences, so that
//! opcodes and scores line up with the values the matching thresholds were
//! tuned on.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Sequences at least this long get popular elements dropped from the index
const AUTOJUNK_MIN_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// Edit operation turning `a[a_start..a_end]` into `b[b_start..b_end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
}

/// Run of `size` equal items starting at `a` in the first and `b` in the second sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

pub struct SequenceMatcher<'s, T> {
    a: &'s [T],
    b: &'s [T],
    b2j: HashMap<&'s T, Vec<usize>>,
}

impl<'s, T> SequenceMatcher<'s, T>
where
    T: Eq + std::hash::Hash,
{
    pub fn new(a: &'s [T], b: &'s [T]) -> Self {
        let mut b2j: HashMap<&'s T, Vec<usize>> = HashMap::new();
        for (j, item) in b.iter().enumerate() {
            b2j.entry(item).or_default().push(j);
        }

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let limit = n / 100 + 1;
            let popular: HashSet<&'s T> = b2j
                .iter()
                .filter(|(_, positions)| positions.len() > limit)
                .map(|(item, _)| *item)
                .collect();
            for item in popular {
                b2j.remove(item);
            }
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`, earliest on ties.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Popular items are not indexed but may still extend a match.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        MatchBlock {
            a: best_i,
            b: best_j,
            size: best_size,
        }
    }

    /// Non-adjacent matching blocks, terminated by a zero sized sentinel
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size > 0 {
                blocks.push(block);
                if alo < block.a && blo < block.b {
                    queue.push((alo, block.a, blo, block.b));
                }
                if block.a + block.size < ahi && block.b + block.size < bhi {
                    queue.push((block.a + block.size, ahi, block.b + block.size, bhi));
                }
            }
        }
        blocks.sort();

        let mut merged = Vec::with_capacity(blocks.len() + 1);
        let mut current = MatchBlock { a: 0, b: 0, size: 0 };
        for block in blocks {
            if current.a + current.size == block.a && current.b + current.size == block.b {
                current.size += block.size;
            } else {
                if current.size > 0 {
                    merged.push(current);
                }
                current = block;
            }
        }
        if current.size > 0 {
            merged.push(current);
        }
        merged.push(MatchBlock {
            a: la,
            b: lb,
            size: 0,
        });
        merged
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        let (mut i, mut j) = (0, 0);
        let mut codes = Vec::new();

        for block in self.matching_blocks() {
            let tag = if i < block.a && j < block.b {
                Some(OpTag::Replace)
            } else if i < block.a {
                Some(OpTag::Delete)
            } else if j < block.b {
                Some(OpTag::Insert)
            } else {
                None
            };
            if let Some(tag) = tag {
                codes.push(Opcode {
                    tag,
                    a_start: i,
                    a_end: block.a,
                    b_start: j,
                    b_end: block.b,
                });
            }
            i = block.a + block.size;
            j = block.b + block.size;
            if block.size > 0 {
                codes.push(Opcode {
                    tag: OpTag::Equal,
                    a_start: block.a,
                    a_end: i,
                    b_start: block.b,
                    b_end: j,
                });
            }
        }
        codes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub op: OpTag,
    pub source: String,
    pub target: String,
    pub source_start: usize,
    pub target_start: usize,
}

/// Case sensitive differences between two strings, in opcode order
pub fn string_differences(source: &str, target: &str) -> Vec<Difference> {
    let a: Vec<char> = source.chars().collect();
    let b: Vec<char> = target.chars().collect();

    SequenceMatcher::new(&a, &b)
        .opcodes()
        .into_iter()
        .map(|code| Difference {
            op: code.tag,
            source: a[code.a_start..code.a_end].iter().collect(),
            target: b[code.b_start..code.b_end].iter().collect(),
            source_start: code.a_start,
            target_start: code.b_start,
        })
        .collect()
}

/// Similarity metrics between a text and a text searched for in it.
///
/// Lower `dissimilarity_score` is better; zero means `search_text` was found
/// as one contiguous run with nothing inserted or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityReport {
    pub dissimilarity_score: usize,
    pub text_length: usize,
    pub subtext_length: usize,
    pub unmatched_char_count: usize,
    pub matched_char_count: usize,
    pub gap_char_count: usize,
    pub inserted_char_count: usize,
    pub replaced_char_count: usize,
    pub matches: Vec<String>,
    pub replacements: Vec<(String, String)>,
    pub gaps: Vec<String>,
}

pub fn string_similarity(main_text: &str, search_text: &str) -> SimilarityReport {
    let a: Vec<char> = main_text.chars().collect();
    let b: Vec<char> = search_text.chars().collect();

    let mut segments: Vec<Opcode> = SequenceMatcher::new(&a, &b)
        .opcodes()
        .into_iter()
        .filter(|code| code.tag != OpTag::Delete)
        .collect();
    segments.sort_by_key(|code| code.a_start);

    let gap_ranges: Vec<(usize, usize)> = segments
        .windows(2)
        .filter(|pair| pair[0].a_end < pair[1].a_start)
        .map(|pair| (pair[0].a_end, pair[1].a_start))
        .collect();

    let slice = |chars: &[char], start: usize, end: usize| -> String {
        chars[start..end].iter().collect()
    };

    let mut report = SimilarityReport {
        dissimilarity_score: 0,
        text_length: a.len(),
        subtext_length: b.len(),
        unmatched_char_count: 0,
        matched_char_count: 0,
        gap_char_count: gap_ranges.iter().map(|(start, end)| end - start).sum(),
        inserted_char_count: 0,
        replaced_char_count: 0,
        matches: Vec::new(),
        replacements: Vec::new(),
        gaps: gap_ranges
            .iter()
            .map(|&(start, end)| slice(&a, start, end))
            .collect(),
    };

    for code in &segments {
        match code.tag {
            OpTag::Equal => {
                report.matched_char_count += code.b_end - code.b_start;
                report.matches.push(slice(&a, code.a_start, code.a_end));
            }
            OpTag::Insert => report.inserted_char_count += code.b_end - code.b_start,
            OpTag::Replace => {
                report.replaced_char_count += code.a_end - code.a_start;
                report.replacements.push((
                    slice(&a, code.a_start, code.a_end),
                    slice(&b, code.b_start, code.b_end),
                ));
            }
            OpTag::Delete => {}
        }
    }

    report.unmatched_char_count = report.subtext_length - report.matched_char_count;
    report.dissimilarity_score = report.unmatched_char_count
        + report.inserted_char_count
        + report.replaced_char_count
        + report.gap_char_count;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let a = chars(" abcd");
        let b = chars("abcd abcd");
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(
            matcher.find_longest_match(0, 5, 0, 9),
            MatchBlock { a: 0, b: 4, size: 5 }
        );
    }

    #[test]
    fn test_matching_blocks() {
        let a = chars("abxcd");
        let b = chars("abcd");
        let blocks = SequenceMatcher::new(&a, &b).matching_blocks();
        assert_eq!(
            blocks,
            vec![
                MatchBlock { a: 0, b: 0, size: 2 },
                MatchBlock { a: 3, b: 2, size: 2 },
                MatchBlock { a: 5, b: 4, size: 0 },
            ]
        );
    }

    #[test]
    fn test_opcodes_cover_both_sequences() {
        let a = chars("qabxcd");
        let b = chars("abycdf");
        let tags: Vec<(OpTag, usize, usize, usize, usize)> = SequenceMatcher::new(&a, &b)
            .opcodes()
            .into_iter()
            .map(|c| (c.tag, c.a_start, c.a_end, c.b_start, c.b_end))
            .collect();

        assert_eq!(
            tags,
            vec![
                (OpTag::Delete, 0, 1, 0, 0),
                (OpTag::Equal, 1, 3, 0, 2),
                (OpTag::Replace, 3, 4, 2, 3),
                (OpTag::Equal, 4, 6, 3, 5),
                (OpTag::Insert, 6, 6, 5, 6),
            ]
        );
    }

    #[test]
    fn test_autojunk_drops_popular_characters() {
        let a = chars("xxxxxq");
        let b = chars(&format!("q{}qxxxx", "x".repeat(198)));
        let blocks = SequenceMatcher::new(&a, &b).matching_blocks();

        // 'x' is too frequent in a 204 item sequence to anchor a match
        assert_eq!(
            blocks,
            vec![
                MatchBlock { a: 5, b: 0, size: 1 },
                MatchBlock { a: 6, b: 204, size: 0 },
            ]
        );
    }

    #[test]
    fn test_short_sequences_keep_every_character() {
        let a = chars("xxq");
        let b = chars("qxxq");
        let blocks = SequenceMatcher::new(&a, &b).matching_blocks();
        assert_eq!(blocks[0], MatchBlock { a: 0, b: 1, size: 3 });
    }

    #[test]
    fn test_string_differences() {
        let diffs = string_differences("BOL 123", "BOL 128");
        assert_eq!(diffs[0].op, OpTag::Equal);
        assert_eq!(diffs[0].source, "BOL 12");
        assert_eq!(diffs[1].op, OpTag::Replace);
        assert_eq!(diffs[1].source, "3");
        assert_eq!(diffs[1].target, "8");
        assert_eq!(diffs[1].source_start, 6);
    }

    #[test]
    fn test_identical_strings_score_zero() {
        let report = string_similarity("hazmat", "hazmat");
        assert_eq!(report.dissimilarity_score, 0);
        assert_eq!(report.matched_char_count, 6);
        assert_eq!(report.matches, vec!["hazmat".to_string()]);
    }

    #[test]
    fn test_exact_substring_of_longer_text() {
        let report = string_similarity("Hello World! This is a test string.", "This is");
        assert_eq!(report.text_length, 35);
        assert_eq!(report.subtext_length, 7);
        assert_eq!(report.matched_char_count, 7);
        assert_eq!(report.unmatched_char_count, 0);
        assert_eq!(report.dissimilarity_score, 0);
    }

    #[test]
    fn test_replacement_and_gap_are_counted() {
        let report = string_similarity("order 1539964", "order 1539 64");
        assert_eq!(report.replaced_char_count, 1);
        assert_eq!(report.replacements, vec![("9".to_string(), " ".to_string())]);
        assert_eq!(report.unmatched_char_count, 1);
        assert_eq!(report.dissimilarity_score, 2);
    }

    #[test]
    fn test_gap_between_matches() {
        let report = string_similarity("ab--cd", "abcd");
        assert_eq!(report.gaps, vec!["--".to_string()]);
        assert_eq!(report.gap_char_count, 2);
        assert_eq!(report.dissimilarity_score, 2);
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let report = string_similarity("World! 🌍", "World! 🌍");
        assert_eq!(report.text_length, 8);
        assert_eq!(report.dissimilarity_score, 0);
    }
}
