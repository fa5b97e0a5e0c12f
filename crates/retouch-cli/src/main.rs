use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use retouch_contracts::media::decode_data_uri;
use retouch_contracts::{
    EffectCatalog, EffectMode, ErrorCategory, TransformError, TransformResponse,
    TransformationKind, TransformationParams,
};
use retouch_engine::ProviderConfig;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "retouch-rs", version, about = "Apply hosted portrait and image effects")]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every supported effect.
    Effects(EffectsArgs),
    /// Run one transformation and save the result.
    Transform(TransformArgs),
}

#[derive(Debug, Args)]
struct ProviderArgs {
    #[arg(long, global = true, env = "RETOUCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true, env = "RETOUCH_API_BASE")]
    api_base: Option<String>,
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,
    #[arg(long, global = true)]
    max_attempts: Option<u32>,
}

impl ProviderArgs {
    fn to_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::from_env();
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key.as_str());
        }
        if let Some(api_base) = &self.api_base {
            config = config.with_api_base(api_base.as_str());
        }
        if let Some(ms) = self.poll_interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(attempts) = self.max_attempts {
            config = config.with_max_attempts(attempts);
        }
        config
    }
}

#[derive(Debug, Args)]
struct EffectsArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct TransformArgs {
    #[arg(long)]
    kind: TransformationKind,
    #[arg(long)]
    image: PathBuf,
    /// Kind-specific parameters as a JSON object.
    #[arg(long)]
    params: Option<String>,
    #[arg(long)]
    out: Option<PathBuf>,
    /// Print the full response object instead of the output path.
    #[arg(long)]
    json: bool,
}

const EXIT_TRANSFORM_FAILED: i32 = 2;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("retouch-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Command::Effects(args) => {
            print_effects(EffectCatalog::shared(), args.json)?;
            Ok(0)
        }
        Command::Transform(args) => {
            let config = cli.provider.to_config();
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(run_transform(config, args))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_effects(catalog: &EffectCatalog, json: bool) -> Result<()> {
    if json {
        let descriptors: Vec<_> = catalog.list().collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }
    for descriptor in catalog.list() {
        let line = effect_line(
            descriptor.kind,
            descriptor.mode,
            descriptor.media.mime(),
            descriptor.endpoint,
        );
        println!("{line}");
    }
    Ok(())
}

fn effect_line(kind: TransformationKind, mode: EffectMode, mime: &str, endpoint: &str) -> String {
    let mode = match mode {
        EffectMode::Sync => "sync",
        EffectMode::Async => "async",
    };
    format!("{:<20} {mode:<5} {mime:<10} {endpoint}", kind.as_str())
}

async fn run_transform(config: ProviderConfig, args: TransformArgs) -> Result<i32> {
    let image = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read {}", args.image.display()))?;

    let response = match parse_params(args.kind, args.params.as_deref()) {
        Ok(params) => {
            let cancel = CancellationToken::new();
            let watcher = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling transform");
                    watcher.cancel();
                }
            });
            retouch_engine::transform(&config, args.kind, &params, &image, &cancel).await
        }
        Err(err) => TransformResponse::from(Err(err)),
    };

    if let Some(media) = &response.media {
        let out = args
            .out
            .clone()
            .unwrap_or_else(|| default_output_path(&args.image, args.kind, &media.media_type));
        write_media(&out, &media.data_uri)?;
        if !args.json {
            println!("{}", out.display());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if let Some(error) = &response.error {
        let status = response.http_status.unwrap_or_default();
        eprintln!("transform failed (HTTP {status}): {error}");
    }

    Ok(if response.success {
        0
    } else {
        EXIT_TRANSFORM_FAILED
    })
}

fn parse_params(
    kind: TransformationKind,
    raw: Option<&str>,
) -> Result<TransformationParams, TransformError> {
    let value = match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => serde_json::from_str::<Value>(raw).map_err(|err| {
            TransformError::new(
                ErrorCategory::Validation,
                format!("--params is not valid JSON: {err}"),
            )
        })?,
        None => Value::Null,
    };
    Ok(TransformationParams::from_json(kind, value)?)
}

fn default_output_path(image: &Path, kind: TransformationKind, mime: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "result".to_string());
    image.with_file_name(format!("{stem}-{kind}.{}", extension_for(mime)))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

fn write_media(path: &Path, data_uri: &str) -> Result<()> {
    let (_, bytes) = decode_data_uri(data_uri).context("provider result is not a data URI")?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn transform_args_parse_kind_and_globals() -> Result<()> {
        let cli = Cli::try_parse_from([
            "retouch-rs",
            "transform",
            "--kind",
            "image_crop",
            "--image",
            "portrait.jpg",
            "--params",
            r#"{"width": 1080, "height": 1080}"#,
            "--poll-interval-ms",
            "250",
            "--max-attempts",
            "3",
        ])?;
        let Command::Transform(args) = cli.command else {
            panic!("expected transform command");
        };
        assert_eq!(args.kind, TransformationKind::ImageCrop);
        assert_eq!(args.image, PathBuf::from("portrait.jpg"));

        let config = cli.provider.to_config();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_attempts, 3);
        Ok(())
    }

    #[test]
    fn unknown_kind_is_rejected_by_the_parser() {
        let parsed = Cli::try_parse_from([
            "retouch-rs",
            "transform",
            "--kind",
            "levitate",
            "--image",
            "portrait.jpg",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn params_parse_into_typed_variant() -> Result<()> {
        let params = parse_params(TransformationKind::Upscale, Some(r#"{"factor": 4}"#))?;
        assert_eq!(params, TransformationParams::Upscale { factor: 4 });
        assert_eq!(
            parse_params(TransformationKind::Denoise, None)?,
            TransformationParams::Denoise {}
        );
        Ok(())
    }

    #[test]
    fn bad_params_are_validation_failures() {
        let err = parse_params(TransformationKind::Age, Some("{not json"))
            .expect_err("invalid JSON");
        assert_eq!(err.category, ErrorCategory::Validation);

        let err = parse_params(TransformationKind::Age, Some("{}")).expect_err("missing age");
        assert_eq!(err.http_status, 400);
        assert!(err.message.contains("target_age"), "{}", err.message);
    }

    #[test]
    fn output_path_sits_next_to_input() {
        let out = default_output_path(
            Path::new("/photos/me.png"),
            TransformationKind::CinematicEffect,
            "video/mp4",
        );
        assert_eq!(out, PathBuf::from("/photos/me-cinematic-effect.mp4"));
    }

    #[test]
    fn write_media_decodes_data_uri() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("out.jpg");
        let uri = format!("data:image/jpeg;base64,{}", BASE64.encode(b"jpeg-bytes"));
        write_media(&path, &uri)?;
        assert_eq!(fs::read(&path)?, b"jpeg-bytes");

        assert!(write_media(&dir.path().join("bad.jpg"), "not a uri").is_err());
        Ok(())
    }

    #[test]
    fn effect_lines_show_mode_and_media() {
        let line = effect_line(
            TransformationKind::Hairstyle,
            EffectMode::Async,
            "image/jpeg",
            "portrait/effects/hairstyle-editor-pro",
        );
        assert!(line.starts_with("hairstyle"));
        assert!(line.contains("async"));
        assert!(line.ends_with("portrait/effects/hairstyle-editor-pro"));
    }
}
