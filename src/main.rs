mod cli;

use clipforged::{config, MediaService};
use clipforged_av::{check_tools, BatchTemplate, ToolKind};
use clipforged_common::{sanitize_filename, OperationResult};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, Tool};
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipforged=trace,clipforged_av=trace,clipforged_common=debug".to_string()
        } else {
            "clipforged=info,clipforged_av=info,clipforged_common=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sanitize { ref name } => {
            println!("{}", sanitize_filename(name));
            Ok(())
        }
        Commands::Validate {
            config: ref config_path,
        } => {
            let path = config_path.clone().or(cli.config.clone());
            validate_config(path.as_deref())
        }
        _ => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run(cli, config))
        }
    }
}

async fn run(cli: Cli, config: config::Config) -> Result<()> {
    let json = cli.json;

    if let Commands::CheckTools = cli.command {
        return report_tools(&config, json).await;
    }

    let service = MediaService::new(config);

    match cli.command {
        Commands::Run { command } => {
            let result = service.run_command(&command).await;
            finish(&result, json)
        }
        Commands::Exec { tool, output, args } => {
            let kind = match tool {
                Tool::Ffmpeg => ToolKind::Engine,
                Tool::Ffprobe => ToolKind::Inspector,
            };
            let _guard = cancel_on_ctrl_c(service.shutdown_token());
            let result = service.run_tool(kind, args, output.as_deref()).await;
            finish(&result, json)
        }
        Commands::Probe { file } => probe_file(&service, &file, json).await,
        Commands::Capture { command, output } => capture(&service, &command, &output, json).await,
        Commands::Batch {
            inputs,
            output,
            args,
        } => {
            let template = BatchTemplate::new(args, output)?;
            let _guard = cancel_on_ctrl_c(service.shutdown_token());
            let results = service.batch(&template, &inputs).await;

            let failed = results.iter().filter(|r| !r.success).count();
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    print_result(result);
                }
                println!("\n{} item(s), {} failed", results.len(), failed);
            }

            if failed > 0 {
                anyhow::bail!("{} of {} batch item(s) failed", failed, results.len());
            }
            Ok(())
        }
        Commands::Upload { file } => finish(&service.upload_path(&file), json),
        Commands::CheckTools | Commands::Sanitize { .. } | Commands::Validate { .. } => Ok(()),
    }
}

/// Cancel `token` on Ctrl-C until the returned guard is dropped.
fn cancel_on_ctrl_c(token: CancellationToken) -> tokio_util::sync::DropGuard {
    let watcher = CancellationToken::new();
    let stop = watcher.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupted, cancelling");
                token.cancel();
            }
            _ = stop.cancelled() => {}
        }
    });
    watcher.drop_guard()
}

async fn probe_file(service: &MediaService, file: &str, json: bool) -> Result<()> {
    let path = service.store().resolve(file)?;
    let info = service.probe_info(&path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", path.display());
    for (key, value) in &info.format {
        println!("  {key}: {value}");
    }

    println!("\nStreams: {}", info.streams.len());
    for (i, stream) in info.streams.iter().enumerate() {
        let field = |key: &str| stream.get(key).map(String::as_str).unwrap_or("?");
        print!("  [{}] {} {}", i, field("codec_type"), field("codec_name"));
        if let (Some(w), Some(h)) = (stream.get("width"), stream.get("height")) {
            print!(" {w}x{h}");
        }
        if let Some(channels) = stream.get("channels") {
            print!(" {channels}ch");
        }
        println!();
    }

    Ok(())
}

async fn capture(service: &MediaService, command: &str, output: &str, json: bool) -> Result<()> {
    let started = service.capture_start(command, output).await;
    if !started.success {
        return finish(&started, json);
    }
    if !json {
        print_result(&started);
        println!("Recording, press Ctrl-C to stop...");
    }

    tokio::signal::ctrl_c().await?;

    let stopped = service.capture_stop().await;
    finish(&stopped, json)
}

async fn report_tools(config: &config::Config, json: bool) -> Result<()> {
    let tools = check_tools(&config.tools.ffmpeg, &config.tools.ffprobe).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Checking external tools...\n");
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them or set [tools] paths in the config.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Working directory: {}", config.work_dir.display());
    println!("  ffmpeg: {}", config.tools.ffmpeg);
    println!("  ffprobe: {}", config.tools.ffprobe);
    println!("  Timeout: {}s", config.tools.timeout_secs);
    println!("  Overwrite: {}", config.tools.overwrite);
    println!("  Capture on active: {:?}", config.capture.on_active);

    Ok(())
}

fn print_result(result: &OperationResult) {
    if result.success {
        println!("✓ {}", result.message);
    } else {
        println!(
            "✗ {}: {}",
            result.message,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(ref output) = result.output {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }
    if let Some(ref file) = result.output_file {
        println!("Output file: {}", file);
    }
}

fn finish(result: &OperationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print_result(result);
    }

    if !result.success {
        anyhow::bail!(
            "{}",
            result.error.as_deref().unwrap_or(result.message.as_str())
        );
    }
    Ok(())
}
