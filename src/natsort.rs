// DAGBENCH NATURAL SORT
// ORDERS BENCHMARK INPUTS BY PROBLEM SIZE: "dag2.ag" BEFORE "dag10.ag"
//
// A NAME SPLITS INTO ALTERNATING TEXT / NUMBER SEGMENTS. THE KEY ALWAYS
// STARTS AND ENDS WITH A (POSSIBLY EMPTY) TEXT SEGMENT, SO SEGMENTS AT THE
// SAME INDEX OF TWO KEYS ARE ALWAYS THE SAME KIND.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("static digit-run pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    // DIGITS WITH LEADING ZEROS STRIPPED. COMPARED BY LENGTH, THEN LEXICALLY,
    // WHICH IS INTEGER ORDER WITHOUT ANY OVERFLOW LIMIT.
    Number(&'a str),
}

impl Ord for Segment<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(a), Segment::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            // UNREACHABLE FOR KEYS BUILT BY natural_key, KEPT TOTAL ANYWAY
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn natural_key(name: &str) -> Vec<Segment<'_>> {
    let mut key = Vec::new();
    let mut last = 0;
    for m in DIGIT_RUN.find_iter(name) {
        key.push(Segment::Text(&name[last..m.start()]));
        key.push(Segment::Number(m.as_str().trim_start_matches('0')));
        last = m.end();
    }
    key.push(Segment::Text(&name[last..]));
    key
}

// COMPARE TWO NAMES THE WAY A HUMAN EXPECTS: EMBEDDED NUMBERS BY VALUE,
// EVERYTHING ELSE LEXICOGRAPHICALLY
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

pub fn sort_naturally<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

pub fn sorted_naturally<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = names.into_iter().map(Into::into).collect();
    sort_naturally(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value() {
        let sorted = sorted_naturally(["dag2.txt", "dag10.txt", "dag1.txt"]);
        assert_eq!(sorted, vec!["dag1.txt", "dag2.txt", "dag10.txt"]);
    }

    #[test]
    fn file2_before_file10() {
        assert_eq!(natural_cmp("file2", "file10"), Ordering::Less);
        assert_eq!(natural_cmp("file10", "file2"), Ordering::Greater);
    }

    #[test]
    fn text_segments_compare_lexically() {
        assert_eq!(natural_cmp("alpha5", "beta1"), Ordering::Less);
        // BYTE ORDER: UPPERCASE SORTS BEFORE LOWERCASE
        assert_eq!(natural_cmp("Z1", "a1"), Ordering::Less);
    }

    #[test]
    fn key_shape_alternates() {
        let key = natural_key("a10b2");
        assert_eq!(
            key,
            vec![
                Segment::Text("a"),
                Segment::Number("10"),
                Segment::Text("b"),
                Segment::Number("2"),
                Segment::Text(""),
            ]
        );
        assert_eq!(natural_key("42"), vec![
            Segment::Text(""),
            Segment::Number("42"),
            Segment::Text(""),
        ]);
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        let small = "run99999999999999999999999999.ag";
        let big = "run100000000000000000000000000.ag";
        assert_eq!(natural_cmp(small, big), Ordering::Less);
    }

    #[test]
    fn leading_zeros_are_equal_and_stable() {
        assert_eq!(natural_cmp("dag01", "dag1"), Ordering::Equal);
        assert_eq!(natural_cmp("dag000", "dag0"), Ordering::Equal);

        let mut names = vec!["dag1", "dag01", "dag001"];
        sort_naturally(&mut names);
        assert_eq!(names, vec!["dag1", "dag01", "dag001"]);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(natural_cmp("dag", "dag1"), Ordering::Less);
        assert_eq!(natural_cmp("dag1", "dag1.ag"), Ordering::Less);
    }

    #[test]
    fn empty_input() {
        let sorted = sorted_naturally(Vec::<String>::new());
        assert!(sorted.is_empty());
        assert_eq!(natural_cmp("", ""), Ordering::Equal);
    }
}
