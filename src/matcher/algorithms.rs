// src/matcher/algorithms.rs

/// Jaro score above which the common-prefix boost is applied.
pub const JARO_WINKLER_THRESHOLD: f64 = 0.7;

/// Upper bound on the per-character prefix boost.
const JARO_WINKLER_COEF: f64 = 0.1;

/// Levenshtein distance over `char`s (insertions, deletions and
/// substitutions each cost 1).
pub fn levenshtein_distance(source: &str, target: &str) -> usize {
    let source_chars: Vec<char> = source.chars().collect();
    let target_chars: Vec<char> = target.chars().collect();
    levenshtein_chars(&source_chars, &target_chars)
}

pub(crate) fn levenshtein_chars(source: &[char], target: &[char]) -> usize {
    if source.is_empty() {
        return target.len();
    }
    if target.is_empty() {
        return source.len();
    }

    // Two rows instead of the full matrix.
    let mut prev: Vec<usize> = (0..=target.len()).collect();
    let mut curr = vec![0usize; target.len() + 1];

    for i in 1..=source.len() {
        curr[0] = i;
        for j in 1..=target.len() {
            let cost = if source[i - 1] == target[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)             // deletion
                .min(curr[j - 1] + 1)           // insertion
                .min(prev[j - 1] + cost);       // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[target.len()]
}

/// Levenshtein distance if it is at most `max_distance`, `None` otherwise.
///
/// Bails out as soon as the length difference or a whole DP row exceeds
/// the bound.
pub fn bounded_levenshtein(source: &str, target: &str, max_distance: usize) -> Option<usize> {
    let source_chars: Vec<char> = source.chars().collect();
    let target_chars: Vec<char> = target.chars().collect();
    bounded_levenshtein_chars(&source_chars, &target_chars, max_distance)
}

pub(crate) fn bounded_levenshtein_chars(source: &[char], target: &[char], max_distance: usize) -> Option<usize> {
    if source.len().abs_diff(target.len()) > max_distance {
        return None;
    }
    if source.is_empty() || target.is_empty() {
        let distance = source.len().max(target.len());
        return (distance <= max_distance).then_some(distance);
    }

    let mut prev: Vec<usize> = (0..=target.len()).collect();
    let mut curr = vec![0usize; target.len() + 1];

    for i in 1..=source.len() {
        curr[0] = i;
        let mut row_min = curr[0];
        for j in 1..=target.len() {
            let cost = if source[i - 1] == target[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }
        // Row minima never decrease, so nothing below can recover.
        if row_min > max_distance {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[target.len()];
    (distance <= max_distance).then_some(distance)
}

/// A normalized string distance in `[0, 1]` used to gate cluster growth.
pub trait SecondaryMetric: Send + Sync {
    fn distance(&self, source: &str, target: &str) -> f64;
}

/// Jaro-Winkler similarity with the prefix boost scaled by the longer
/// string's length and applied only above [`JARO_WINKLER_THRESHOLD`].
#[derive(Debug, Clone)]
pub struct JaroWinkler {
    threshold: f64,
}

impl JaroWinkler {
    pub fn new() -> Self {
        Self { threshold: JARO_WINKLER_THRESHOLD }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn similarity(&self, source: &str, target: &str) -> f64 {
        if source == target {
            return 1.0;
        }

        let s1: Vec<char> = source.chars().collect();
        let s2: Vec<char> = target.chars().collect();
        let alignment = Alignment::of(&s1, &s2);

        // Single precision keeps scores identical to the common Java and
        // C# string-similarity libraries.
        let m = alignment.matches as f32;
        if m == 0.0 {
            return 0.0;
        }
        let jaro = ((m / s1.len() as f32
            + m / s2.len() as f32
            + (m - alignment.transpositions as f32) / m)
            / 3.0) as f64;

        if jaro > self.threshold {
            let coef = JARO_WINKLER_COEF.min(1.0 / alignment.longer_len as f64);
            jaro + coef * alignment.prefix as f64 * (1.0 - jaro)
        } else {
            jaro
        }
    }
}

impl Default for JaroWinkler {
    fn default() -> Self {
        Self::new()
    }
}

impl SecondaryMetric for JaroWinkler {
    #[inline]
    fn distance(&self, source: &str, target: &str) -> f64 {
        1.0 - self.similarity(source, target)
    }
}

struct Alignment {
    matches: usize,
    transpositions: usize,
    prefix: usize,
    longer_len: usize,
}

impl Alignment {
    fn of(s1: &[char], s2: &[char]) -> Self {
        let (longer, shorter) = if s1.len() > s2.len() { (s1, s2) } else { (s2, s1) };
        let range = (longer.len() / 2).saturating_sub(1);

        let mut match_indexes: Vec<Option<usize>> = vec![None; shorter.len()];
        let mut match_flags = vec![false; longer.len()];
        let mut matches = 0usize;

        for (mi, &c) in shorter.iter().enumerate() {
            let start = mi.saturating_sub(range);
            let end = (mi + range + 1).min(longer.len());
            for xi in start..end {
                if !match_flags[xi] && c == longer[xi] {
                    match_indexes[mi] = Some(xi);
                    match_flags[xi] = true;
                    matches += 1;
                    break;
                }
            }
        }

        let shorter_matched = shorter.iter()
            .zip(&match_indexes)
            .filter(|(_, index)| index.is_some())
            .map(|(c, _)| *c);
        let longer_matched = longer.iter()
            .zip(&match_flags)
            .filter(|(_, flag)| **flag)
            .map(|(c, _)| *c);
        let half_transpositions = shorter_matched.zip(longer_matched)
            .filter(|(a, b)| a != b)
            .count();

        // Prefix is taken over the original argument order, up to the
        // shorter length.
        let prefix = s1.iter()
            .zip(s2.iter())
            .take(shorter.len())
            .take_while(|(a, b)| a == b)
            .count();

        Self {
            matches,
            transpositions: half_transpositions / 2,
            prefix,
            longer_len: longer.len(),
        }
    }
}
