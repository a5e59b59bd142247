use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    Cli::command().debug_assert();
}

#[test]
fn test_vape_defaults() {
    let cli = Cli::try_parse_from(["forum", "vape"]).unwrap();
    match cli.command {
        Commands::Vape(args) => {
            assert_eq!(args.migtarget, "default");
            assert!(!args.dry_run);
        }
        other => panic!("expected vape, got {other:?}"),
    }
    assert!(!cli.global.verbose);
    assert!(cli.global.config.is_none());
}

#[test]
fn test_vape_target_and_globals() {
    let cli = Cli::try_parse_from([
        "forum",
        "vape",
        "--migtarget",
        "audit",
        "--dry-run",
        "--config",
        "/etc/forum.yml",
        "-v",
    ])
    .unwrap();
    match cli.command {
        Commands::Vape(args) => {
            assert_eq!(args.migtarget, "audit");
            assert!(args.dry_run);
        }
        other => panic!("expected vape, got {other:?}"),
    }
    assert!(cli.global.verbose);
    assert_eq!(cli.global.config.as_deref(), Some("/etc/forum.yml"));
}

#[test]
fn test_units_json_output() {
    let cli = Cli::try_parse_from(["forum", "units", "-o", "json", "-t", "core"]).unwrap();
    match cli.command {
        Commands::Units(args) => {
            assert_eq!(args.output, UnitsOutput::Json);
            assert_eq!(args.migtarget, "core");
        }
        other => panic!("expected units, got {other:?}"),
    }
}

#[test]
fn test_id_subcommands() {
    let cli = Cli::try_parse_from(["forum", "id", "new", "--count", "3"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Id(IdArgs {
            command: IdCommands::New { count: 3 }
        })
    ));

    let cli = Cli::try_parse_from(["forum", "id", "decode", "JVzh"]).unwrap();
    match cli.command {
        Commands::Id(IdArgs {
            command: IdCommands::Decode { value },
        }) => assert_eq!(value, "JVzh"),
        other => panic!("expected id decode, got {other:?}"),
    }
}

#[test]
fn test_id_encode_rejects_non_numbers() {
    assert!(Cli::try_parse_from(["forum", "id", "encode", "abc"]).is_err());
}

#[test]
fn test_migrations_dir_help_explains_fallback() {
    let help = Cli::command().render_long_help().to_string();
    assert!(help.contains("--migrations-dir"));
    assert!(help.contains("Only consulted when the units"), "{help}");
}
