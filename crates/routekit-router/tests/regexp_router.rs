use routekit_router::{RegExpRouter, Router, RouterConfig, RouterError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn handlers(router: &RegExpRouter<&'static str>, method: &str, path: &str) -> Vec<&'static str> {
    router
        .match_path(method, path)
        .expect("routes must compile")
        .map(|m| m.handlers.into_iter().copied().collect())
        .unwrap_or_default()
}

#[test]
fn same_pattern_keeps_registration_order() {
    init_tracing();
    let mut router = RegExpRouter::new();
    router.add("GET", "/user", "h1").unwrap();
    router.add("GET", "/user", "h2").unwrap();
    assert_eq!(handlers(&router, "GET", "/user"), vec!["h1", "h2"]);
}

#[test]
fn named_param_is_extracted() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/user/:id", "get_user").unwrap();
    let m = router.match_path("GET", "/user/42").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"get_user"]);
    assert_eq!(m.params, vec![("id", "42")]);
}

#[test]
fn constrained_param_rejects_non_matching_segment() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/user/:id{[0-9]+}", "get_user").unwrap();
    assert!(router.match_path("GET", "/user/abc").unwrap().is_none());
    let m = router.match_path("GET", "/user/42").unwrap().unwrap();
    assert_eq!(m.param("id"), Some("42"));
}

#[test]
fn constraint_spanning_segments() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/files/:path{.+\\.png}", "image").unwrap();
    let m = router.match_path("GET", "/files/a/b/c.png").unwrap().unwrap();
    assert_eq!(m.param("path"), Some("a/b/c.png"));
    assert!(router.match_path("GET", "/files/a/b/c.jpg").unwrap().is_none());
}

#[test]
fn prefix_route_does_not_leak_into_longer_path() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/user", "user").unwrap();
    router.add("GET", "/user/comments", "comments").unwrap();
    assert_eq!(handlers(&router, "GET", "/user/comments"), vec!["comments"]);
    assert_eq!(handlers(&router, "GET", "/user"), vec!["user"]);
    assert!(handlers(&router, "GET", "/user/other").is_empty());
}

#[test]
fn literal_wins_over_param_sibling() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/user/:id", "by_id").unwrap();
    router.add("GET", "/user/me", "me").unwrap();
    let m = router.match_path("GET", "/user/me").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"me"]);
    assert!(!m.has_params());
    assert_eq!(handlers(&router, "GET", "/user/7"), vec!["by_id"]);
}

#[test]
fn ambiguous_routes_fail_at_build_not_add() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/:lang/about", "about").unwrap();
    router.add("GET", "/en/:page", "page").unwrap();

    let err = router.match_path("GET", "/en/about").unwrap_err();
    assert!(matches!(err, RouterError::UnsupportedPattern { .. }));
    assert_eq!(err.to_string(), "unsupported path: /:lang/about");
}

#[test]
fn ambiguity_is_scoped_to_the_method() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/:lang/about", "about").unwrap();
    router.add("POST", "/en/:page", "page").unwrap();
    assert_eq!(handlers(&router, "GET", "/en/about"), vec!["about"]);
    assert_eq!(handlers(&router, "POST", "/en/about"), vec!["page"]);
}

#[test]
fn repeated_matches_are_identical() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/user/:id", "get_user").unwrap();
    router.add("ALL", "*", "logger").unwrap();

    let first = router.match_path("GET", "/user/1").unwrap();
    assert!(router.is_built());
    let second = router.match_path("GET", "/user/1").unwrap();
    assert_eq!(first, second);
}

#[test]
fn wildcards_act_as_middleware() {
    let mut router = RegExpRouter::new();
    router.add("ALL", "*", "logger").unwrap();
    router.add("GET", "/assets/*", "static").unwrap();
    router.add("GET", "/api/*", "auth").unwrap();
    router.add("GET", "/api/users/:id", "get_user").unwrap();

    assert_eq!(
        handlers(&router, "GET", "/assets/a/b/c"),
        vec!["logger", "static"]
    );
    assert_eq!(handlers(&router, "GET", "/assets"), vec!["logger", "static"]);
    assert_eq!(handlers(&router, "GET", "/elsewhere"), vec!["logger"]);
    assert_eq!(handlers(&router, "POST", "/assets/x"), vec!["logger"]);

    let m = router.match_path("GET", "/api/users/9").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"logger", &"auth", &"get_user"]);
    assert_eq!(m.param("id"), Some("9"));
}

#[test]
fn parameter_name_propagates_as_alias() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/user/:id/*", "load_user").unwrap();
    router.add("GET", "/user/:userId/posts", "posts").unwrap();

    let m = router.match_path("GET", "/user/7/posts").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"load_user", &"posts"]);
    assert_eq!(m.param("userId"), Some("7"));
    assert_eq!(m.param("id"), Some("7"));

    let m = router.match_path("GET", "/user/7/settings").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"load_user"]);
    assert_eq!(m.params, vec![("id", "7")]);
}

#[test]
fn literal_under_general_param_is_bound() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/:section/*", "section").unwrap();
    router.add("GET", "/docs/intro", "intro").unwrap();

    let m = router.match_path("GET", "/docs/intro").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"section", &"intro"]);
    assert_eq!(m.param("section"), Some("docs"));
}

#[test]
fn conflicting_group_names_use_secondary_matcher() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/a/:x{(?P<n>[0-9]+)}", "digits").unwrap();
    router.add("GET", "/b/:y{(?P<n>[a-z]+)}", "letters").unwrap();

    let m = router.match_path("GET", "/a/12").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"digits"]);
    assert_eq!(m.param("x"), Some("12"));

    let m = router.match_path("GET", "/b/xyz").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"letters"]);
    assert_eq!(m.param("y"), Some("xyz"));
}

#[test]
fn unknown_method_reaches_catch_all_secondary_matcher() {
    let mut router = RegExpRouter::new();
    router.add("ALL", "/a/:x{(?P<n>[0-9]+)}", "a").unwrap();
    router.add("ALL", "/b/:y{(?P<n>[a-z]+)}", "b").unwrap();

    let m = router.match_path("PURGE", "/b/xyz").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"b"]);
    assert_eq!(m.params, vec![("y", "xyz")]);

    let m = router.match_path("PURGE", "/a/12").unwrap().unwrap();
    assert_eq!(m.handlers, vec![&"a"]);
    assert_eq!(m.param("x"), Some("12"));
    assert!(router.match_path("PURGE", "/b/12").unwrap().is_none());
}

#[test]
fn add_after_build_is_frozen() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/a", "a").unwrap();
    router.build().unwrap();
    let err = router.add("GET", "/b", "b").unwrap_err();
    assert_eq!(err, RouterError::Frozen);
    assert_eq!(
        err.to_string(),
        "can not add a route since the matcher is already built"
    );
}

#[test]
fn duplicate_parameter_name_reported_at_build() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/:id/posts/:id", "h").unwrap();
    assert_eq!(
        router.build(),
        Err(RouterError::duplicate_param("id", "/:id/posts/:id"))
    );
}

#[test]
fn static_routes_per_method() {
    let mut router = RegExpRouter::new();
    router.add("GET", "/user", "list").unwrap();
    router.add("GET", "/user/:id", "get").unwrap();
    router.add("ALL", "/ping", "ping").unwrap();

    let routes = router.static_routes().unwrap();
    let get = &routes["GET"];
    assert_eq!(get.len(), 2);
    assert_eq!(get["/user"].handlers, vec![&"list"]);
    assert_eq!(get["/ping"].handlers, vec![&"ping"]);
    assert!(!get.contains_key("/user/:id"));
    assert_eq!(routes["ALL"].len(), 1);
}

#[test]
fn unknown_method_falls_back_to_catch_all() {
    let mut router = RegExpRouter::with_config(RouterConfig::new().catch_all_method("ANY"));
    router.add("ANY", "/health", "health").unwrap();
    router.add("GET", "/user", "user").unwrap();
    assert_eq!(handlers(&router, "OPTIONS", "/health"), vec!["health"]);
    assert_eq!(handlers(&router, "GET", "/health"), vec!["health"]);
    assert!(handlers(&router, "OPTIONS", "/user").is_empty());
}

#[test]
fn concurrent_lookups_share_one_build() {
    let mut router = RegExpRouter::new();
    for i in 0..32 {
        router
            .add("GET", &format!("/item{i}/:id"), format!("item{i}"))
            .unwrap();
    }

    std::thread::scope(|s| {
        for t in 0..4 {
            let router = &router;
            s.spawn(move || {
                for i in 0..32 {
                    let path = format!("/item{i}/{t}");
                    let m = router.match_path("GET", &path).unwrap().unwrap();
                    assert_eq!(m.handlers, vec![&format!("item{i}")]);
                    assert_eq!(m.param("id"), Some(t.to_string().as_str()));
                }
            });
        }
    });
    assert!(router.is_built());
}
