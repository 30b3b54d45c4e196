//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{
        directory_name, make_absolute, make_relative, normalize_path, WildcardPattern,
    };
    use proptest::prelude::*;

    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z]{1,6}", 0..5)
    }

    fn to_path(segments: &[String], file: &str) -> String {
        let mut path = String::from("/");
        for segment in segments {
            path.push_str(segment);
            path.push('/');
        }
        path.push_str(file);
        path
    }

    // ============================================================================
    // make_relative property tests
    // ============================================================================

    proptest! {
        /// Property: a path made relative to the base solution resolves back to
        /// the original target when combined with the base directory
        #[test]
        fn make_relative_round_trips_through_base_directory(
            common in segments(),
            base_rest in segments(),
            target_rest in segments(),
        ) {
            let base_dirs: Vec<String> = common.iter().chain(base_rest.iter()).cloned().collect();
            let target_dirs: Vec<String> = common.iter().chain(target_rest.iter()).cloned().collect();
            let base = normalize_path(&to_path(&base_dirs, "Base.sln")).unwrap();
            let target = normalize_path(&to_path(&target_dirs, "Target.csproj")).unwrap();

            let relative = make_relative(&base, &target);
            let resolved = make_absolute(directory_name(&base), &relative).unwrap();
            prop_assert_eq!(resolved, target);
        }

        /// Property: targets inside the base directory never climb
        #[test]
        fn make_relative_inside_base_directory_has_no_parent_segments(
            dirs in segments(),
            nested in segments(),
        ) {
            let all: Vec<String> = dirs.iter().chain(nested.iter()).cloned().collect();
            let base = normalize_path(&to_path(&dirs, "Base.sln")).unwrap();
            let target = normalize_path(&to_path(&all, "Target.csproj")).unwrap();

            let relative = make_relative(&base, &target);
            prop_assert!(!relative.contains(".."), "unexpected climb in {}", relative);
        }
    }

    // ============================================================================
    // normalize_path property tests
    // ============================================================================

    proptest! {
        /// Property: normalization is idempotent
        #[test]
        fn normalize_path_is_idempotent(dirs in segments()) {
            let once = normalize_path(&to_path(&dirs, "x.sln")).unwrap();
            let twice = normalize_path(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Property: both separators are accepted on input
        #[test]
        fn normalize_path_accepts_either_separator(dirs in segments()) {
            let forward = to_path(&dirs, "x.sln");
            let backward = forward.replace('/', "\\");
            prop_assert_eq!(
                normalize_path(&forward).unwrap(),
                normalize_path(&backward).unwrap()
            );
        }
    }

    // ============================================================================
    // WildcardPattern property tests
    // ============================================================================

    proptest! {
        /// Property: a pattern without wildcards only matches itself
        #[test]
        fn wildcard_without_metacharacters_is_literal(name in "[A-Za-z.()+\\[\\]-]{1,12}") {
            let pattern = WildcardPattern::new(&name).unwrap();
            prop_assert!(pattern.is_match(&name));
            let longer = format!("{}x", name);
            prop_assert!(!pattern.is_match(&longer));
        }

        /// Property: a trailing star matches any suffix
        #[test]
        fn wildcard_trailing_star_matches_suffixes(prefix in "[A-Za-z]{1,8}", suffix in "[A-Za-z.-]{0,8}") {
            let pattern = WildcardPattern::new(&format!("{}*", prefix)).unwrap();
            let candidate = format!("{}{}", prefix, suffix);
            prop_assert!(pattern.is_match(&candidate));
        }
    }
}
