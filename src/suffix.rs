//! Longest common suffix across a batch of strings.
//!
//! Feeds often append the same boilerplate to every title
//! (`"... | Example News"`). The ingestor records that tail on the source so
//! readers can strip it.

/// Longest suffix shared by every string in `strings`.
///
/// The computation splits the batch in half and combines the two halves'
/// suffixes, so any partition of the input yields the same answer.
pub fn shared_suffix<S: AsRef<str>>(strings: &[S]) -> String {
    match strings {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [a, b] => pair_suffix(a.as_ref(), b.as_ref()).to_string(),
        _ => {
            let (left, right) = strings.split_at(strings.len() / 2);
            let left = shared_suffix(left);
            let right = shared_suffix(right);
            pair_suffix(&left, &right).to_string()
        }
    }
}

/// Compares from the end by `char` until a mismatch or either side runs out.
fn pair_suffix<'a>(a: &'a str, b: &str) -> &'a str {
    let matched: usize = a
        .chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum();

    &a[a.len() - matched..]
}

/// Removes `suffix` from `title` when present, leaving the title untouched if
/// that would empty it.
pub fn trim_suffix<'a>(title: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return title;
    }
    match title.strip_suffix(suffix) {
        Some(stripped) if !stripped.trim().is_empty() => stripped.trim_end(),
        _ => title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_cases() {
        let empty: [&str; 0] = [];
        assert_eq!(shared_suffix(&empty), "");
        assert_eq!(shared_suffix(&["x"]), "x");
    }

    #[test]
    fn test_pairs() {
        assert_eq!(shared_suffix(&["abc", "abc"]), "abc");
        assert_eq!(shared_suffix(&["abc", "xabc"]), "abc");
        assert_eq!(shared_suffix(&["yabc", "xyzabc"]), "abc");
        assert_eq!(shared_suffix(&["yabc", "ihep"]), "");
    }

    #[test]
    fn test_three_or_more() {
        assert_eq!(shared_suffix(&["xabc", "yabc", "xyzabc"]), "abc");
        assert_eq!(shared_suffix(&["xabc", "yabc", "ihep"]), "");
    }

    #[test]
    fn test_one_side_exhausted() {
        assert_eq!(shared_suffix(&["bc", "abc"]), "bc");
        assert_eq!(shared_suffix(&["", "abc"]), "");
    }

    #[test]
    fn test_multibyte_characters() {
        assert_eq!(shared_suffix(&["Zürich – Die Zeit", "Köln – Die Zeit"]), " – Die Zeit");
        assert_eq!(shared_suffix(&["naïve", "ïve"]), "ïve");
    }

    #[test]
    fn test_any_binary_split_agrees() {
        let inputs: Vec<Vec<&str>> = vec![
            vec!["Story one | Daily Planet", "Two | Daily Planet", "3 - Daily Planet", "x Planet"],
            vec!["aaa", "baa", "caa", "a", "daa"],
            vec!["same", "same", "same"],
            vec!["abc", "def", "abc"],
        ];

        for list in inputs {
            let whole = shared_suffix(&list);
            for split in 1..list.len() {
                let (left, right) = list.split_at(split);
                let combined = shared_suffix(&[shared_suffix(left), shared_suffix(right)]);
                assert_eq!(combined, whole, "split at {} of {:?}", split, list);
            }
        }
    }

    #[test]
    fn test_trim_suffix() {
        assert_eq!(trim_suffix("Big news | Planet", " | Planet"), "Big news");
        assert_eq!(trim_suffix("Big news", ""), "Big news");
        assert_eq!(trim_suffix(" | Planet", " | Planet"), " | Planet");
    }
}
