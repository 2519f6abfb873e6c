use clap::Parser;
use formkit_cli::{run, Cli};
use formkit_config::ConfigLoader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("formkit=debug,formkit_cli=debug,formkit_engine=debug,formkit_fields=debug,formkit_store=debug,formkit_image=debug,formkit_config=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = dispatch(cli).await;
    std::process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> i32 {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut stdout = std::io::stdout().lock();
    match run(cli.command, &config, &mut stdout).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formkit_cli::{Commands, CustomAction};

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["formkit", "sections", "form.yaml", "--debug"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Sections { .. }));
    }

    #[test]
    fn parses_custom_remove() {
        let cli = Cli::parse_from(["formkit", "custom", "remove", "inventory-item", "custom_42"]);
        match cli.command {
            Commands::Custom {
                action: CustomAction::Remove { entity, name },
            } => {
                assert_eq!(entity, "inventory-item");
                assert_eq!(name, "custom_42");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_normalize_image_limits() {
        let cli = Cli::parse_from([
            "formkit",
            "--config",
            "formkit.toml",
            "normalize-image",
            "in.png",
            "out.jpg",
            "--max-dimension",
            "640",
        ]);
        assert!(cli.config.is_some());
        match cli.command {
            Commands::NormalizeImage {
                max_bytes,
                max_dimension,
                ..
            } => {
                assert_eq!(max_bytes, None);
                assert_eq!(max_dimension, Some(640));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn submit_requires_entity_and_values() {
        assert!(Cli::try_parse_from(["formkit", "submit", "form.yaml"]).is_err());
    }
}
