use hyprconf::{Config, ConfigError, ConfigOptions};

fn strict() -> Config {
    Config::with_options(ConfigOptions {
        strict: true,
        ..ConfigOptions::default()
    })
}

#[test]
fn test_basic_if_exists() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        $MY_VAR = value

        # hyprlang if MY_VAR
        included = included_value
        # hyprlang endif

        # hyprlang if MISSING_VAR
        excluded = excluded_value
        # hyprlang endif
    "#,
        )
        .unwrap();

    // Variable exists, so included should be set
    assert_eq!(config.get("included").as_deref(), Some("included_value"));

    // Variable doesn't exist, so excluded should not be set
    assert!(config.get("excluded").is_none());
}

#[test]
fn test_negated_if_missing() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        $EXISTING_VAR = value

        # hyprlang if !MISSING_VAR
        included = included_value
        # hyprlang endif

        # hyprlang if !EXISTING_VAR
        excluded = excluded_value
        # hyprlang endif
    "#,
        )
        .unwrap();

    assert_eq!(config.get("included").as_deref(), Some("included_value"));
    assert!(config.get("excluded").is_none());
}

#[test]
fn test_empty_variable_is_falsy() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        $EMPTY =
        # hyprlang if EMPTY
        excluded = yes
        # hyprlang endif
        # hyprlang if !EMPTY
        included = yes
        # hyprlang endif
    "#,
        )
        .unwrap();

    assert!(config.get("excluded").is_none());
    assert_eq!(config.get("included").as_deref(), Some("yes"));
}

#[test]
fn test_nested_if_statements() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        $VAR1 = value1
        $VAR2 = value2

        # hyprlang if VAR1
            # hyprlang if VAR2
                both_exist = test_yes
            # hyprlang endif
        # hyprlang endif

        # hyprlang if VAR1
            # hyprlang if MISSING
                one_exists = test_no
            # hyprlang endif
            after_inner = test_yes
        # hyprlang endif
    "#,
        )
        .unwrap();

    assert_eq!(config.get("both_exist").as_deref(), Some("test_yes"));
    assert!(config.get("one_exists").is_none());
    assert_eq!(config.get("after_inner").as_deref(), Some("test_yes"));
}

#[test]
fn test_false_outer_skips_inner_blocks() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        $PRESENT = 1

        # hyprlang if MISSING
            # hyprlang if PRESENT
                hidden = test_no
            # hyprlang endif
            also_hidden = test_no
        # hyprlang endif
        visible = test_yes
    "#,
        )
        .unwrap();

    assert!(config.get("hidden").is_none());
    assert!(config.get("also_hidden").is_none());
    assert_eq!(config.get("visible").as_deref(), Some("test_yes"));
}

#[test]
fn test_three_level_nesting() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        $A = 1
        $B = 2
        $C = 3

        # hyprlang if A
            # hyprlang if B
                # hyprlang if C
                    all_three = test_yes
                # hyprlang endif
            # hyprlang endif
        # hyprlang endif
    "#,
        )
        .unwrap();

    assert_eq!(config.get("all_three").as_deref(), Some("test_yes"));
}

#[test]
fn test_noerror_directive() {
    let mut config = strict();
    config
        .parse(
            r#"
        # hyprlang noerror true
        valid = value
        # hyprlang noerror false
    "#,
        )
        .unwrap();

    assert_eq!(config.get("valid").as_deref(), Some("value"));
}

#[test]
fn test_if_with_categories() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        $ENABLE_FEATURE = test_yes

        # hyprlang if ENABLE_FEATURE
        feature {
            setting1 = value1
            setting2 = value2
        }
        # hyprlang endif

        # hyprlang if DISABLED_FEATURE
        disabled {
            setting = test_no
        }
        # hyprlang endif
    "#,
        )
        .unwrap();

    assert_eq!(config.get("feature:setting1").as_deref(), Some("value1"));
    assert_eq!(config.get("feature:setting2").as_deref(), Some("value2"));
    assert!(config.get("disabled:setting").is_none());
    assert_eq!(config.document().categories.len(), 1);
}

#[test]
fn test_if_inside_category_body() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        general {
            gaps_in = 5
            # hyprlang if NOT_DEFINED_ANYWHERE
            gaps_out = 20
            # hyprlang endif
            border_size = 2
        }
    "#,
        )
        .unwrap();

    assert_eq!(config.get("general:gaps_in").as_deref(), Some("5"));
    assert!(config.get("general:gaps_out").is_none());
    assert_eq!(config.get("general:border_size").as_deref(), Some("2"));
}

#[test]
fn test_environment_fallback() {
    // PATH is set in any test environment
    let mut config = Config::new();
    config
        .parse(
            r#"
        # hyprlang if PATH
        env_exists = test_yes
        # hyprlang endif

        # hyprlang if !HYPRCONF_TEST_SURELY_MISSING_ENV
        no_env = test_yes
        # hyprlang endif
    "#,
        )
        .unwrap();

    assert_eq!(config.get("env_exists").as_deref(), Some("test_yes"));
    assert_eq!(config.get("no_env").as_deref(), Some("test_yes"));
}

#[test]
fn test_environment_not_used_for_substitution() {
    let mut config = Config::new();
    config.parse("value = $PATH\n").unwrap();
    assert_eq!(config.get("value").as_deref(), Some("$PATH"));
}

#[test]
fn test_endif_without_if() {
    // lenient: ignored
    let mut config = Config::new();
    config
        .parse(
            r#"
        value = test
        # hyprlang endif
    "#,
        )
        .unwrap();
    assert_eq!(config.get("value").as_deref(), Some("test"));

    // strict: reported
    let mut config = strict();
    let err = config
        .parse(
            r#"
        value = test
        # hyprlang endif
    "#,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::Multiple { ref errors } if errors.len() == 1));
}

#[test]
fn test_unclosed_if() {
    let source = r#"
        $VAR = value
        # hyprlang if VAR
        value = test
    "#;

    let mut config = Config::new();
    config.parse(source).unwrap();
    assert_eq!(config.get("value").as_deref(), Some("test"));

    let mut config = strict();
    assert!(config.parse(source).is_err());
    assert_eq!(config.report().diagnostics.len(), 1);
}

#[test]
fn test_unclosed_false_if_skips_to_end() {
    let mut config = Config::new();
    config
        .parse(
            r#"
        before = 1
        # hyprlang if MISSING
        after = 2
    "#,
        )
        .unwrap();

    assert_eq!(config.get("before").as_deref(), Some("1"));
    assert!(config.get("after").is_none());
}
