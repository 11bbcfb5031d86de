use clap::Parser;
use std::fs;
use studiotree::flat::FlatRecord;
use studiotree::tooling::cli::{Cli, CliContext, Commands, EntryCommands, ProjectCommands};
use tempfile::TempDir;

use crate::integration::support::with_xdg_env;

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["studiotree", "project", "list"],
        vec!["studiotree", "project", "create", "demo", "--empty"],
        vec!["studiotree", "project", "show", "00", "--format", "json"],
        vec!["studiotree", "entry", "add", "00", "src/a.js", "--content", "x"],
        vec!["studiotree", "entry", "mv", "00", "a.js", "--to", "src", "--index", "0"],
        vec!["studiotree", "import", "./site", "--strategy", "replace"],
        vec!["studiotree", "export", "00", "--dir", "./out"],
        vec!["studiotree", "apply", "00", "records.json"],
        vec!["studiotree", "edit", "00", "script.json"],
    ];
    for args in cases {
        assert!(Cli::try_parse_from(args.clone()).is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_conflicting_flags() {
    assert!(Cli::try_parse_from(["studiotree", "project", "create", "x", "--empty", "--from", "f.json"]).is_err());
    assert!(Cli::try_parse_from(["studiotree", "import", "d", "--project", "00", "--name", "n"]).is_err());
    assert!(Cli::try_parse_from(["studiotree", "apply", "00", "f.json", "--strategy", "merge"]).is_err());
}

#[test]
fn import_edit_export_round_trip() {
    let temp = TempDir::new().unwrap();
    with_xdg_env(&temp, || {
        let workspace = temp.path().join("workspace");
        let site = temp.path().join("site");
        fs::create_dir_all(&workspace).unwrap();
        fs::create_dir_all(site.join("src")).unwrap();
        fs::write(site.join("src/main.js"), "main").unwrap();
        fs::write(site.join("README.md"), "readme").unwrap();

        let cli = CliContext::new(workspace.clone(), None).unwrap();
        assert!(cli.store_path().starts_with(temp.path().join("data")));

        cli.execute(&Commands::Import {
            dir: site.clone(),
            project: None,
            name: Some("site".to_string()),
            strategy: None,
            include_hidden: false,
        })
        .unwrap();
        let project = cli.api().list_projects().unwrap()[0].id.clone();

        let script = temp.path().join("script.json");
        fs::write(
            &script,
            r#"[
                {"op": "mkdir", "path": "src/lib"},
                {"op": "move", "path": "src/main.js", "to": "src/lib"},
                {"op": "write", "path": "README.md", "content": "updated"}
            ]"#,
        )
        .unwrap();
        cli.execute(&Commands::Edit {
            project: project.to_string(),
            script,
        })
        .unwrap();

        let out = temp.path().join("out");
        cli.execute(&Commands::Export {
            project: project.to_string(),
            dir: Some(out.clone()),
        })
        .unwrap();
        assert_eq!(fs::read_to_string(out.join("src/lib/main.js")).unwrap(), "main");
        assert_eq!(fs::read_to_string(out.join("README.md")).unwrap(), "updated");
        assert!(!out.join("src/main.js").exists());
    });
}

#[test]
fn failed_script_saves_nothing() {
    let temp = TempDir::new().unwrap();
    with_xdg_env(&temp, || {
        let workspace = temp.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let cli = CliContext::new(workspace, None).unwrap();
        cli.execute(&Commands::Project {
            command: ProjectCommands::Create {
                name: "demo".to_string(),
                from: None,
                empty: false,
            },
        })
        .unwrap();
        let project = cli.api().list_projects().unwrap()[0].id.clone();

        let script = temp.path().join("bad.json");
        fs::write(
            &script,
            r#"[{"op": "delete", "path": "src"}, {"op": "rename", "path": "nope", "name": "x"}]"#,
        )
        .unwrap();
        let err = cli
            .execute(&Commands::Edit {
                project: project.to_string(),
                script,
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(cli.api().get_project(&project).unwrap().files.len(), 5);
    });
}

#[test]
fn apply_records_file_reports_sync_stats() {
    let temp = TempDir::new().unwrap();
    with_xdg_env(&temp, || {
        let workspace = temp.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let cli = CliContext::new(workspace, None).unwrap();
        cli.execute(&Commands::Project {
            command: ProjectCommands::Create {
                name: "demo".to_string(),
                from: None,
                empty: true,
            },
        })
        .unwrap();
        let project = cli.api().list_projects().unwrap()[0].id.clone();

        let records = vec![FlatRecord::folder("docs"), FlatRecord::file("docs/a.md", "a")];
        let file = temp.path().join("records.json");
        fs::write(&file, serde_json::to_string(&records).unwrap()).unwrap();

        let output = cli
            .execute(&Commands::Apply {
                project: project.to_string(),
                file,
                strategy: None,
            })
            .unwrap();
        assert!(output.starts_with("Synced 2 entries"));

        let output = cli
            .execute(&Commands::Entry {
                command: EntryCommands::Rm {
                    project: project.to_string(),
                    path: "docs".to_string(),
                },
            })
            .unwrap();
        assert_eq!(output, "Deleted docs (2 entries)");
    });
}

#[test]
fn project_list_json_contract() {
    let temp = TempDir::new().unwrap();
    with_xdg_env(&temp, || {
        let workspace = temp.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let cli = CliContext::new(workspace, None).unwrap();
        for name in ["one", "two"] {
            cli.execute(&Commands::Project {
                command: ProjectCommands::Create {
                    name: name.to_string(),
                    from: None,
                    empty: true,
                },
            })
            .unwrap();
        }
        let output = cli
            .execute(&Commands::Project {
                command: ProjectCommands::List {
                    format: "json".to_string(),
                },
            })
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        for item in items {
            assert!(item.get("id").and_then(|v| v.as_str()).is_some());
            assert!(item.get("name").and_then(|v| v.as_str()).is_some());
            assert!(item.get("createdAt").and_then(|v| v.as_i64()).is_some());
            assert!(item.get("updatedAt").and_then(|v| v.as_i64()).is_some());
        }
    });
}
