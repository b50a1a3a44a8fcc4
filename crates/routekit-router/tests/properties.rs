use std::collections::BTreeSet;

use proptest::prelude::*;
use routekit_router::{RegExpRouter, Router, TrieRouter};

fn literal_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,3}", 1..4).prop_map(|segments| format!("/{}", segments.join("/")))
}

fn expected(routes: &BTreeSet<String>, probe: &str) -> Option<usize> {
    routes.iter().position(|r| r == probe)
}

proptest! {
    #[test]
    fn literal_routes_match_by_string_equality(
        routes in prop::collection::btree_set(literal_path(), 1..12),
        probes in prop::collection::vec(literal_path(), 1..12),
    ) {
        let mut regexp = RegExpRouter::new();
        let mut trie = TrieRouter::new();
        for (i, path) in routes.iter().enumerate() {
            regexp.add("GET", path, i).unwrap();
            trie.add("GET", path, i).unwrap();
        }

        for probe in routes.iter().chain(&probes) {
            let want = expected(&routes, probe);
            let got = regexp
                .match_path("GET", probe)
                .unwrap()
                .map(|m| m.handlers.into_iter().copied().collect::<Vec<_>>());
            prop_assert_eq!(got, want.map(|i| vec![i]));

            let got = trie
                .match_path("GET", probe)
                .unwrap()
                .map(|m| m.handlers.into_iter().copied().collect::<Vec<_>>());
            prop_assert_eq!(got, want.map(|i| vec![i]));
        }
    }

    #[test]
    fn param_value_is_the_segment(segment in "[a-zA-Z0-9_.-]{1,12}") {
        let mut router = RegExpRouter::new();
        router.add("GET", "/item/:id", ()).unwrap();
        let path = format!("/item/{segment}");
        let m = router.match_path("GET", &path).unwrap().unwrap();
        prop_assert_eq!(m.param("id"), Some(segment.as_str()));
    }

    #[test]
    fn matching_is_repeatable(path in "/[a-z/]{0,16}") {
        let mut router = RegExpRouter::new();
        router.add("ALL", "*", 0).unwrap();
        router.add("GET", "/a/*", 1).unwrap();
        router.add("GET", "/a/:x/b", 2).unwrap();
        let first = router.match_path("GET", &path).unwrap();
        let second = router.match_path("GET", &path).unwrap();
        prop_assert!(first.is_some());
        prop_assert_eq!(first, second);
    }
}
