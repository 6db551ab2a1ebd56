use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["sociometer"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn run_defaults_to_config_values() {
    let cli = Cli::try_parse_from(["sociometer", "run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            targets: None,
            platform: None,
            label: None,
            max_posts: None,
            manual_login: false,
        })
    ));
}

#[test]
fn run_with_filters() {
    let cli = Cli::try_parse_from([
        "sociometer",
        "run",
        "--platform",
        "x",
        "--label",
        "acme",
        "--max-posts",
        "10",
        "--targets",
        "other.yaml",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            targets: Some(ref t),
            platform: Some(Platform::Twitter),
            label: Some(ref l),
            max_posts: Some(10),
            manual_login: false,
        }) if l == "acme" && t == &PathBuf::from("other.yaml")
    ));
}

#[test]
fn run_rejects_unknown_platform() {
    assert!(Cli::try_parse_from(["sociometer", "run", "--platform", "myspace"]).is_err());
}

#[test]
fn login_requires_platform() {
    assert!(Cli::try_parse_from(["sociometer", "login"]).is_err());

    let cli = Cli::try_parse_from([
        "sociometer",
        "login",
        "--platform",
        "instagram",
        "--max-wait-secs",
        "600",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Login {
            platform: Platform::Instagram,
            max_wait_secs: Some(600),
        })
    ));
}

#[test]
fn identify_takes_positional_url() {
    let cli = Cli::try_parse_from(["sociometer", "identify", "https://x.com/acme"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Identify { ref url }) if url == "https://x.com/acme"
    ));
}

#[test]
fn describe_url_names_platform_and_identity() {
    assert_eq!(describe_url("https://x.com/acme"), "twitter\tacme");
    assert_eq!(
        describe_url("https://elsewhere.example/acme"),
        "no supported platform recognizes https://elsewhere.example/acme"
    );
}

#[tokio::test]
async fn cancel_on_fires_when_the_signal_resolves() {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let cancel = cancel_on(async move {
        rx.await.map_err(|e| std::io::Error::other(e.to_string()))
    });
    assert!(!cancel.is_cancelled());

    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
        .await
        .expect("token should be cancelled");
}

#[tokio::test]
async fn cancel_on_ignores_a_failed_signal() {
    let cancel = cancel_on(async { Err(std::io::Error::other("no signal handler")) });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!cancel.is_cancelled());
}
