use archivolt::render::raster::{RasterError, RasterOptions, svg_to_jpeg, svg_to_png};
use archivolt::render::{HeadlessError, RenderOptions, render_views};
use archivolt::{EngineError, GenerateOptions, Studio, override_from_json};
use serde_json::json;
use std::io::Read as _;
use std::path::PathBuf;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Engine(EngineError),
    Render(HeadlessError),
    Raster(RasterError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Engine(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EngineError> for CliError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Render(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Describe,
    Merge,
    Generate,
    Render,
}

#[derive(Debug)]
struct Args {
    command: Command,
    template: Option<String>,
    overrides: Option<String>,
    pretty: bool,
    out: Option<String>,
    out_dir: Option<String>,
    xsd_dir: Option<String>,
    no_validate: bool,
    view: Option<String>,
    png: bool,
    jpg: bool,
    scale: f32,
    background: Option<String>,
}

fn usage() -> &'static str {
    "archivolt-cli\n\
\n\
USAGE:\n\
  archivolt-cli describe <template.xml> [--pretty]\n\
  archivolt-cli merge <template.xml> <override.json|-> [--out <path>] [--pretty]\n\
  archivolt-cli generate <template.xml> <override.json|-> [--out <path>] [--xsd-dir <dir>] [--no-validate] [--pretty]\n\
  archivolt-cli render <template.xml> [<override.json>|-] [--view <id-or-name>] [--out-dir <dir>] [--png] [--jpg] [--scale <n>] [--background <css-color>] [--pretty]\n\
\n\
NOTES:\n\
  - '-' reads the override document from stdin.\n\
  - merge prints the consolidated model JSON to stdout; --out also writes it.\n\
  - generate writes the patched XML and prints a JSON summary; validation runs\n\
    only when --xsd-dir is given and --no-validate is absent.\n\
  - render writes one SVG per selected view (plus PNG/JPG when requested) and\n\
    prints a JSON summary with data URIs.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut it = argv.iter().skip(1).peekable();
    let command = match it.next().map(String::as_str) {
        Some("describe") => Command::Describe,
        Some("merge") => Command::Merge,
        Some("generate") => Command::Generate,
        Some("render") => Command::Render,
        Some("--help") | Some("-h") | None => return Err(CliError::Usage(usage())),
        Some(_) => return Err(CliError::Usage(usage())),
    };

    let mut args = Args {
        command,
        template: None,
        overrides: None,
        pretty: false,
        out: None,
        out_dir: None,
        xsd_dir: None,
        no_validate: false,
        view: None,
        png: false,
        jpg: false,
        scale: 1.0,
        background: None,
    };

    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--pretty" => args.pretty = true,
            "--no-validate" => args.no_validate = true,
            "--png" => args.png = true,
            "--jpg" => args.jpg = true,
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--out-dir" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out_dir = Some(dir.clone());
            }
            "--xsd-dir" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.xsd_dir = Some(dir.clone());
            }
            "--view" => {
                let Some(view) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.view = Some(view.clone());
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.scale = scale.parse::<f32>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.scale.is_finite() && args.scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            other if other.starts_with("--") => return Err(CliError::Usage(usage())),
            value => {
                if args.template.is_none() {
                    args.template = Some(value.to_string());
                } else if args.overrides.is_none() {
                    args.overrides = Some(value.to_string());
                } else {
                    return Err(CliError::Usage(usage()));
                }
            }
        }
    }

    if args.template.is_none() {
        return Err(CliError::Usage(usage()));
    }
    if matches!(args.command, Command::Merge | Command::Generate) && args.overrides.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_override_text(source: &str) -> Result<String, CliError> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn run(argv: &[String]) -> Result<(), CliError> {
    let args = parse_args(argv)?;
    let template = PathBuf::from(args.template.as_deref().unwrap_or_default());
    let studio = Studio::new();

    match args.command {
        Command::Describe => {
            let summary = studio.describe(&template)?;
            print_json(&serde_json::to_value(&summary)?, args.pretty)?;
        }
        Command::Merge => {
            let text = read_override_text(args.overrides.as_deref().unwrap_or_default())?;
            let overrides = override_from_json(&text)?;
            let consolidation = studio.consolidate(&template, &overrides)?;
            for issue in &consolidation.dangling {
                eprintln!(
                    "warning: unresolved reference \"{}\" in {}",
                    issue.reference, issue.context
                );
            }
            if let Some(out) = args.out.as_deref() {
                studio.save_consolidated(&consolidation, Some(std::path::Path::new(out)))?;
            }
            if args.pretty {
                println!("{}", consolidation.json);
            } else {
                println!("{}", serde_json::to_string(&consolidation.model)?);
            }
        }
        Command::Generate => {
            let text = read_override_text(args.overrides.as_deref().unwrap_or_default())?;
            let overrides = override_from_json(&text)?;
            let options = GenerateOptions {
                output_path: args.out.as_deref().map(PathBuf::from),
                schema_dir: if args.no_validate {
                    None
                } else {
                    args.xsd_dir.as_deref().map(PathBuf::from)
                },
            };
            let generated = studio.generate(&template, &overrides, &options)?;
            let (validated, errors) = match &generated.validation {
                Some(report) => (report.ok, report.errors.clone()),
                None => (false, Vec::new()),
            };
            print_json(
                &json!({
                    "path": generated.path,
                    "validated": validated,
                    "validation_skipped": generated.validation.is_none(),
                    "errors": errors,
                }),
                args.pretty,
            )?;
        }
        Command::Render => {
            let overrides = match args.overrides.as_deref() {
                Some(source) => override_from_json(&read_override_text(source)?)?,
                None => Default::default(),
            };
            let out_dir = args.out_dir.as_deref().map(PathBuf::from);
            let outcome = render_views(
                &studio,
                &template,
                &overrides,
                args.view.as_deref(),
                out_dir.as_deref(),
                &RenderOptions::default(),
            )?;

            let raster = RasterOptions {
                scale: args.scale,
                background: args.background.clone(),
                ..RasterOptions::default()
            };

            let mut views = Vec::new();
            for artifact in &outcome.artifacts {
                let mut entry = json!({
                    "id": artifact.view_id,
                    "name": artifact.view_name,
                    "svg_path": artifact.svg_path,
                    "svg_data_uri": artifact.svg_data_uri,
                    "width": artifact.width,
                    "height": artifact.height,
                });
                if args.png {
                    let bytes = svg_to_png(&artifact.svg, &raster)?;
                    let png_path = artifact.svg_path.with_extension("png");
                    std::fs::write(&png_path, &bytes)?;
                    entry["png_path"] = json!(png_path);
                    entry["png_data_uri"] =
                        json!(archivolt::render::raster::png_data_uri(&bytes));
                }
                if args.jpg {
                    let bytes = svg_to_jpeg(&artifact.svg, &raster)?;
                    let jpg_path = artifact.svg_path.with_extension("jpg");
                    std::fs::write(&jpg_path, &bytes)?;
                    entry["jpg_path"] = json!(jpg_path);
                }
                views.push(entry);
            }

            let failures: Vec<serde_json::Value> = outcome
                .failures
                .iter()
                .map(|failure| json!({"view": failure.view, "error": failure.error}))
                .collect();
            print_json(&json!({"views": views, "failures": failures}), args.pretty)?;
        }
    }
    Ok(())
}

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    match run(&argv) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
