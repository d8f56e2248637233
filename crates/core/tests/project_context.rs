use stablemap_core::db::{
    load_project_config, resolve_project_path, ProjectConfig, ProjectContext, ProjectLayout,
};

#[test]
fn project_context_loads_config_and_db() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    let config = ProjectConfig::new("CtxProject", layout.db_path_relative_string());
    std::fs::write(&layout.project_config_path, serde_json::to_string_pretty(&config).unwrap())
        .unwrap();

    let ctx = ProjectContext::from_root(temp.path()).expect("context");
    assert_eq!(ctx.config.name, "CtxProject");
    assert!(ctx.config.parallel);
    assert!(!ctx.config.deny_warnings);
    assert!(ctx.db_path.is_file());
    assert!(ctx.db.list_check_runs(None).expect("list runs").is_empty());
}

#[test]
fn project_context_errors_without_config() {
    let temp = tempfile::tempdir().unwrap();
    let err = ProjectContext::from_root(temp.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to read project config"), "unexpected: {err}");
}

#[test]
fn layout_paths_live_under_meta_dir() {
    let layout = ProjectLayout::new("/tmp/proj");
    assert!(layout.project_config_path.ends_with(".stablemap/project.json"));
    assert!(layout.db_path.ends_with(".stablemap/history.db"));
    let expected = std::path::Path::new(".stablemap").join("history.db");
    assert_eq!(layout.db_path_relative_string(), expected.to_string_lossy());
    assert!(layout.run_report_path(7).ends_with("reports/check-7.json"));
    assert!(!layout.is_initialized());
}

#[test]
fn config_defaults_fill_missing_fields() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    std::fs::write(
        &layout.project_config_path,
        r#"{"name":"Old","description":null,"config_version":"0.1.0","db":{"path":".stablemap/history.db"},"inputs":{"old_image":"images/r179.yaml"}}"#,
    )
    .unwrap();

    let config = load_project_config(&layout).expect("config");
    assert!(config.parallel);
    assert!(!config.deny_warnings);
    assert_eq!(config.inputs.old_image.as_deref(), Some("images/r179.yaml"));
    assert!(config.inputs.mapping.is_none());

    let resolved = resolve_project_path(&layout, "images/r179.yaml");
    assert_eq!(resolved, temp.path().join("images/r179.yaml"));
    let absolute = temp.path().join("abs.yaml");
    assert_eq!(resolve_project_path(&layout, &absolute.to_string_lossy()), absolute);
}

#[test]
fn corrupt_config_reports_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    std::fs::write(&layout.project_config_path, "not-json").unwrap();
    let err = load_project_config(&layout).unwrap_err();
    assert!(err.to_string().contains("Failed to parse project config JSON"));
}
