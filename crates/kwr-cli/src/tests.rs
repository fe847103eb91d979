use super::*;

#[test]
fn parses_research_command() {
    let cli =
        Cli::try_parse_from(["kwr", "research", "mime types"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Research { ref term, compact: false } if term == "mime types"
    ));
}

#[test]
fn parses_research_compact_flag() {
    let cli = Cli::try_parse_from(["kwr", "research", "mime types", "--compact"]).unwrap();
    assert!(matches!(cli.command, Commands::Research { compact: true, .. }));
}

#[test]
fn parses_enrich_keywords() {
    let cli = Cli::try_parse_from(["kwr", "enrich", "mime type", "what is mime type"]).unwrap();
    match cli.command {
        Commands::Enrich { keywords, compact } => {
            assert_eq!(keywords, vec!["mime type", "what is mime type"]);
            assert!(!compact);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn enrich_requires_at_least_one_keyword() {
    assert!(Cli::try_parse_from(["kwr", "enrich"]).is_err());
}

#[test]
fn parses_config_command() {
    let cli = Cli::try_parse_from(["kwr", "config"]).unwrap();
    assert!(matches!(cli.command, Commands::Config));
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["kwr"]).is_err());
}
