#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::search::{Market, Suggestion, Tab};
    use crate::{Cli, print_results, run_once};
    use clap::Parser;

    fn suggestion(canonical: &str, exchange: Option<&str>) -> Suggestion {
        Suggestion {
            canonical_symbol: canonical.to_string(),
            short_symbol: canonical.rsplit(':').next().unwrap_or(canonical).to_string(),
            description: Some("Reliance Industries".to_string()),
            exchange: exchange.map(str::to_string),
            asset_type: None,
        }
    }

    #[test]
    fn test_cli_parses_headless_flags() {
        let cli = Cli::try_parse_from([
            "symsearch",
            "--no-tui",
            "-q",
            "RELI",
            "--market",
            "india",
            "--tab",
            "all",
            "--debounce-ms",
            "50",
        ])
        .unwrap();
        assert!(cli.no_tui);
        assert_eq!(cli.query.as_deref(), Some("RELI"));
        assert_eq!(cli.market, Some(Market::India));
        assert_eq!(cli.tab, Some(Tab::All));
        assert_eq!(cli.debounce_ms, Some(50));
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_cli_rejects_unknown_market() {
        assert!(Cli::try_parse_from(["symsearch", "--market", "mars"]).is_err());
    }

    #[test]
    fn test_print_results_rows() {
        let mut out = Vec::new();
        print_results(
            &mut out,
            &[
                suggestion("NSE:RELIANCE", Some("NSE")),
                suggestion("RELIANCE", None),
            ],
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("NSE:RELIANCE"));
        assert!(lines[0].contains("Reliance Industries"));
        assert!(lines[0].ends_with("NSE      -"));
        assert!(lines[1].ends_with("-        -"));
    }

    #[test]
    fn test_print_results_empty() {
        let mut out = Vec::new();
        print_results(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_headless_without_query_is_an_error() {
        let cli = Cli {
            no_tui: true,
            ..Cli::default()
        };
        let err = run_once(&cli, &AppConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("--query"));
    }
}
