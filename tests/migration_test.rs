#![cfg(feature = "hyprland")]

use std::fs;

use hyprconf::{
    ConfigMigrator, ConfigOptions, RuleSyntax, Version, layer_rule, load, parse_str, window_rule,
};

const LEGACY: &str = r#"
$term = kitty

windowrulev2 = float, class:^(pavucontrol)$
windowrulev2 = opacity 0.9 0.9, class:^($term)$, title:^(scratch)$
windowrule = pin, ^(mpv)$
windowrule = float on, match:class ^(already)$
layerrule = blur, waybar
layerrule = ignorezero, rofi

misc {
    new_window_takes_over_fullscreen = 2
}

master {
    inherit_fullscreen = true
    mfact = 0.55
}
"#;

#[test]
fn test_detects_legacy_document() {
    assert!(ConfigMigrator::needs_migration(&parse_str(LEGACY)));
    assert!(!ConfigMigrator::needs_migration(&parse_str(
        "windowrule = float on, match:class ^(x)$\nlayerrule = blur on, match:namespace waybar\n"
    )));
}

#[test]
fn test_summary_lists_each_kind() {
    let summary = ConfigMigrator::summary(&parse_str(LEGACY));
    let bullets: Vec<_> = summary.lines().collect();
    assert_eq!(
        bullets,
        vec![
            "• 3 legacy window rules → windowrule (new syntax)",
            "• 2 legacy layer rules → layerrule (new syntax)",
            "• misc:new_window_takes_over_fullscreen → misc:on_focus_under_fullscreen",
            "• master:inherit_fullscreen → misc:on_focus_under_fullscreen",
        ]
    );
}

#[test]
fn test_summary_empty_when_current() {
    assert_eq!(ConfigMigrator::summary(&parse_str("general {\n    gaps_in = 5\n}\n")), "");
}

#[test]
fn test_migrate_document() {
    let mut doc = parse_str(LEGACY);
    let result = ConfigMigrator::migrate(&mut doc);
    assert_eq!(result.migrated_rules, 5);
    assert_eq!(result.renamed_options, 2);
    assert!(result.backup_path.is_none());

    let rules: Vec<_> = doc
        .lines
        .iter()
        .map(|l| format!("{} = {}", l.key, l.value.raw))
        .collect();
    assert_eq!(
        rules,
        vec![
            "windowrule = float on, match:class ^(pavucontrol)$",
            "windowrule = opacity 0.9 0.9, match:class ^($term)$, match:title ^(scratch)$",
            "windowrule = pin on, match:class ^(mpv)$",
            "windowrule = float on, match:class ^(already)$",
            "layerrule = blur on, match:namespace waybar",
            "layerrule = ignore_alpha 0, match:namespace rofi",
        ]
    );

    // variables keep working inside rewritten rules
    assert_eq!(
        doc.get("windowrule").as_deref(),
        Some("float on, match:class ^(pavucontrol)$")
    );
    assert_eq!(
        doc.lines[1].value.resolve(&doc.bindings()),
        "opacity 0.9 0.9, match:class ^(kitty)$, match:title ^(scratch)$"
    );

    assert_eq!(doc.get("misc:on_focus_under_fullscreen").as_deref(), Some("true"));
    assert_eq!(doc.get("misc:new_window_takes_over_fullscreen"), None);
    assert_eq!(doc.get("master:inherit_fullscreen"), None);
    assert_eq!(doc.get("master:mfact").as_deref(), Some("0.55"));
}

#[test]
fn test_migration_is_idempotent() {
    let mut doc = parse_str(LEGACY);
    ConfigMigrator::migrate(&mut doc);
    let once = doc.serialize();

    assert!(!ConfigMigrator::needs_migration(&doc));
    let again = ConfigMigrator::migrate(&mut doc);
    assert!(again.is_empty());
    assert_eq!(doc.serialize(), once);
}

#[test]
fn test_migrated_output_reparses_identically() {
    let mut doc = parse_str(LEGACY);
    ConfigMigrator::migrate(&mut doc);
    let reparsed = parse_str(&doc.serialize());
    assert_eq!(reparsed, doc);
}

#[test]
fn test_inherit_fullscreen_without_misc_creates_category() {
    let mut doc = parse_str("master {\n    inherit_fullscreen = false\n}\n");
    let result = ConfigMigrator::migrate(&mut doc);
    assert_eq!(result.renamed_options, 1);
    assert_eq!(doc.get("misc:on_focus_under_fullscreen").as_deref(), Some("false"));
    assert!(doc.categories[0].lines.is_empty());
}

#[test]
fn test_migrate_file_writes_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hyprland.conf");
    fs::write(&path, LEGACY).unwrap();

    let result = ConfigMigrator::migrate_file(&path, &ConfigOptions::default()).unwrap();
    assert_eq!(result.migrated_rules, 5);

    let backup = result.backup_path.unwrap();
    assert_eq!(backup.parent(), Some(dir.path()));
    assert!(
        backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("hyprland.conf.bak.")
    );
    assert_eq!(fs::read_to_string(&backup).unwrap(), LEGACY);

    let migrated = load(&path).unwrap();
    assert!(!ConfigMigrator::needs_migration(&migrated));
    assert_eq!(migrated.variables["term"].raw, "kitty");
}

#[test]
fn test_migrate_file_noop_when_current() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hyprland.conf");
    let current = "windowrule = float on, match:class ^(x)$\n";
    fs::write(&path, current).unwrap();

    let result = ConfigMigrator::migrate_file(&path, &ConfigOptions::default()).unwrap();
    assert!(result.is_empty());
    assert!(result.backup_path.is_none());
    assert_eq!(fs::read_to_string(&path).unwrap(), current);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_migrate_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(
        ConfigMigrator::migrate_file(dir.path().join("absent.conf"), &ConfigOptions::default())
            .is_err()
    );
}

#[test]
fn test_rule_builders_follow_version() {
    let old = RuleSyntax::for_version(Some(Version::new(0, 48, 0)));
    let new = RuleSyntax::for_version(Some(Version::new(0, 53, 1)));

    let line = window_rule("workspace 3", "class:^(discord)$", old);
    assert_eq!(
        format!("{} = {}", line.key, line.value.raw),
        "windowrulev2 = workspace 3,class:^(discord)$"
    );

    let line = window_rule("workspace 3", "class:^(discord)$", new);
    assert_eq!(
        format!("{} = {}", line.key, line.value.raw),
        "windowrule = workspace 3, match:class ^(discord)$"
    );

    let line = layer_rule("ignorealpha 0.2", "notifications", new);
    assert_eq!(line.value.raw, "ignore_alpha 0.2, match:namespace notifications");
}
