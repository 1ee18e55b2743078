//! Spell checking using Levenshtein distance
//!
//! The [find_close_words] function accepts a word and a dictionary of valid words
//!     and returns the dictionary words closest to the original word.
//! It is used to produce "did you mean" notes for undefined control sequences.
//!
//! The distance is computed with the textbook dynamic program over a
//!     `(a.len() + 1) x (b.len() + 1)` table, keeping only two rows at a time.

/// A dictionary word together with its distance to the searched word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDiff {
    /// The dictionary word.
    pub word: String,
    /// Levenshtein distance between the searched word and the dictionary word.
    pub distance: usize,
}

/// Find words in the dictionary that are close to the search word.
///
/// Only words within `max_distance` are returned.
/// The result is ordered by distance and then alphabetically, so it is deterministic
///     even when the dictionary comes from a hash map.
///
/// ```
/// # use texparser_stdext::algorithms::spellcheck::find_close_words;
/// let dictionary = vec!["newcommand", "renewcommand", "def"];
/// let close = find_close_words(dictionary, "newcomand", 2);
/// assert_eq!(close[0].word, "newcommand");
/// assert_eq!(close[0].distance, 1);
/// ```
pub fn find_close_words<'a, I: IntoIterator<Item = &'a str>>(
    dictionary: I,
    word: &str,
    max_distance: usize,
) -> Vec<WordDiff> {
    let word: Vec<char> = word.chars().collect();
    let mut diffs: Vec<WordDiff> = dictionary
        .into_iter()
        .filter_map(|candidate| {
            let distance = levenshtein_distance(&word, candidate);
            if distance > max_distance {
                return None;
            }
            Some(WordDiff {
                word: candidate.to_string(),
                distance,
            })
        })
        .collect();
    diffs.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.word.cmp(&b.word)));
    diffs
}

fn levenshtein_distance(a: &[char], b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0_usize; b.len() + 1];
    for (i, a_i) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_j) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(a_i != b_j);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
