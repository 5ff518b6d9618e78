use clap::Parser;
use std::process::ExitCode;
use treaty::{
    cli::{Cli, Commands},
    commands,
    config::Settings,
    telemetry,
};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    telemetry::init_logging(&settings)?;

    let success = match cli.command {
        Commands::Diff {
            old,
            new,
            format,
            fail_on,
        } => {
            let fail_on = fail_on.map(Into::into).unwrap_or(settings.fail_on);
            !commands::execute_diff(&old, &new, format, fail_on)?
        }
        Commands::Validate {
            openapi,
            endpoint,
            direction,
            status,
            body,
            strict,
            ignore_extra,
            only,
            format,
        } => {
            let config = settings.validation_config(strict, ignore_extra, only);

            commands::execute_validate(
                &openapi,
                &body,
                commands::ValidateOptions {
                    endpoint: &endpoint,
                    direction: direction.into(),
                    status: status.as_deref(),
                    config,
                    format,
                },
            )?
        }
        Commands::Sample {
            openapi,
            endpoint,
            direction,
            status,
        } => {
            commands::execute_sample(&openapi, &endpoint, direction.into(), status.as_deref())?;
            true
        }
        Commands::List { openapi } => {
            commands::execute_list(&openapi)?;
            true
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
