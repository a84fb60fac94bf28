use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use restyle::app::StylizeService;
use restyle::infra::genai::GeminiImageProvider;
use restyle::ui::{
    JOB_UPDATE_POLL_INTERVAL_MS, PromptPolicy, StudioController, StudioStatus,
    display_file_name_from_path,
};

const USAGE: &str = "Usage: restyle <content-image> [--style <path>] [--prompt <text>] [--out <dir>]

Stylizes a character photo with a hosted image-generation model.

Arguments:
  <content-image>   Photo of the character to restyle (PNG, JPEG, GIF, WebP)

Options:
  --style <path>    Style reference image whose look is imitated
  --prompt <text>   Override the built-in instruction text
  --out <dir>       Directory for the stylized PNG (default: current directory)
  -h, --help        Print this help";

struct CliArgs {
    content_path: String,
    style_path: Option<String>,
    prompt: Option<String>,
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let args = match parse_args(args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("restyle: {message}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("restyle: {message}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliArgs, String> {
    let mut content_path = None;
    let mut style_path = None;
    let mut prompt = None;
    let mut out_dir = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--style" => {
                style_path = Some(
                    iter.next()
                        .ok_or_else(|| "--style requires a path".to_string())?,
                );
            }
            "--prompt" => {
                prompt = Some(
                    iter.next()
                        .ok_or_else(|| "--prompt requires text".to_string())?,
                );
            }
            "--out" => {
                out_dir = Some(PathBuf::from(
                    iter.next()
                        .ok_or_else(|| "--out requires a directory".to_string())?,
                ));
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option: {other}"));
            }
            other => {
                if content_path.replace(other.to_string()).is_some() {
                    return Err("only one content image may be given".to_string());
                }
            }
        }
    }

    Ok(CliArgs {
        content_path: content_path.ok_or_else(|| "a content image path is required".to_string())?,
        style_path,
        prompt,
        out_dir: out_dir.unwrap_or_else(|| PathBuf::from(".")),
    })
}

fn run(args: CliArgs) -> Result<(), String> {
    let provider = GeminiImageProvider::from_env().map_err(|error| error.user_message())?;
    let service = StylizeService::new(Arc::new(provider));
    let mut controller = StudioController::new(service).map_err(|error| error.user_message())?;

    controller
        .select_content_image(&args.content_path)
        .map_err(|error| {
            format!(
                "{} ({})",
                error.user_message(),
                display_file_name_from_path(&args.content_path)
            )
        })?;

    if let Some(style_path) = &args.style_path {
        controller.select_style_image(style_path).map_err(|error| {
            format!(
                "{} ({})",
                error.user_message(),
                display_file_name_from_path(style_path)
            )
        })?;
    }

    if let Some(prompt) = args.prompt {
        controller.set_prompt_policy(PromptPolicy::Editable);
        controller.set_prompt(prompt);
    }

    controller
        .generate()
        .map_err(|error| error.user_message())?;
    eprintln!("restyle: {}", controller.status().label());

    loop {
        thread::sleep(Duration::from_millis(JOB_UPDATE_POLL_INTERVAL_MS));
        controller.poll_updates();
        match controller.status() {
            StudioStatus::Generating => continue,
            StudioStatus::Success => break,
            StudioStatus::Error { message } => return Err(message.clone()),
            // Content was cleared or never generated; nothing left to wait on.
            _ => return Err("stylization ended without a result".to_string()),
        }
    }

    let saved = controller
        .save_result(&args.out_dir)
        .map_err(|error| error.to_string())?;
    println!("{}", saved.display());
    Ok(())
}
