use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use quickshot::capture::{
    capture_page, CaptureMode, CaptureProvider, CommandCapture, FileCapture, PageInfo,
};
use quickshot::export::{DirectorySink, ExportMeta, SystemClipboard};
use quickshot::handoff::{stash_capture, JsonFileStore};
use quickshot::upload::FolderUploader;
use quickshot::{Color, Editor, EditorConfig, NotificationKind, Point, TextKey, Tool, Viewport};
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SCRIPT_HELP: &str = r##"Edit script JSON schema (a list of actions, or an object with "actions"):
{
  "viewport": {"width": 1280, "height": 800},
  "actions": [
    {"action": "tool", "tool": "highlight"},
    {"action": "color", "color": "#2196F3"},
    {"action": "drag", "from": [100, 100], "to": [200, 150]},
    {"action": "drag", "from": [50, 50], "to": [100, 75], "space": "screen", "leave": true},
    {"action": "tool", "tool": "text"},
    {"action": "text", "at": [120, 90], "value": "Add button", "commit": "enter"},
    {"action": "undo"},
    {"action": "resize", "width": 800, "height": 600},
    {"action": "frame", "out": "frame.png"},
    {"action": "download"},
    {"action": "copy"},
    {"action": "upload"}
  ]
}

Notes:
- points are image-space pixels by default; "space": "screen" uses editing-surface pixels.
- drags shorter than the minimum size in both directions are dropped.
- drag "steps" (pointer moves between down and up) defaults to 4, at most 64.
- text "commit" is one of enter (default), escape, blur.
- upload needs --upload-dir; copy uses the system clipboard.
"##;

#[derive(Parser, Debug)]
#[command(
    name = "quickshot",
    version,
    about = "Capture a screenshot, annotate it with highlights/arrows/text, and export it"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print supported commands in JSON
    Commands,
    /// Capture the visible area and hand it off to the editor store
    Capture(CaptureArgs),
    /// Open the editor on a capture and replay an edit script
    Edit(EditArgs),
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Use an existing image file as the capture
    #[arg(long, conflicts_with = "command")]
    image: Option<PathBuf>,
    /// External screenshot program; "{out}" in --arg is replaced by the output path
    #[arg(long)]
    command: Option<String>,
    /// Argument for --command (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    command_args: Vec<String>,
    /// Seconds to wait for --command
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
    /// Requested capture mode; restricted pages always use "visible"
    #[arg(long, default_value = "visible")]
    mode: String,
    /// Page URL recorded with the capture
    #[arg(long, default_value = "")]
    url: String,
    /// Page title recorded with the capture
    #[arg(long, default_value = "")]
    title: String,
    /// Hand-off store path (default: <out-dir>/store.json)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Print capture metadata JSON to stdout
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Open this image instead of the hand-off store
    #[arg(long)]
    image: Option<PathBuf>,
    /// Hand-off store path (default: <out-dir>/store.json)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Script JSON path (or - for stdin)
    #[arg(long)]
    script: Option<String>,
    /// Editing viewport, e.g. 1280x800
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Viewport>,
    /// Editor config JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for downloads and frames
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Folder used as the upload target
    #[arg(long)]
    upload_dir: Option<PathBuf>,
    /// Disable metadata sidecars for downloads
    #[arg(long, action = ArgAction::SetTrue)]
    no_meta: bool,
    /// Print script schema and exit
    #[arg(long, action = ArgAction::SetTrue)]
    script_help: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Space {
    #[default]
    Image,
    Screen,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TextCommit {
    #[default]
    Enter,
    Escape,
    Blur,
}

const MAX_DRAG_STEPS: u32 = 64;

fn default_drag_steps() -> u32 {
    4
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum Action {
    Tool {
        tool: Tool,
    },
    Color {
        color: Color,
    },
    Drag {
        from: [f64; 2],
        to: [f64; 2],
        #[serde(default)]
        space: Space,
        #[serde(default = "default_drag_steps")]
        steps: u32,
        #[serde(default)]
        leave: bool,
    },
    Text {
        at: [f64; 2],
        value: String,
        #[serde(default)]
        space: Space,
        #[serde(default)]
        commit: TextCommit,
    },
    Undo,
    Resize {
        width: u32,
        height: u32,
    },
    Frame {
        out: PathBuf,
    },
    Download,
    Copy,
    Upload,
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    viewport: Option<Viewport>,
    actions: Vec<Action>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Commands => print_commands(),
        Commands::Capture(args) => command_capture(args),
        Commands::Edit(args) => command_edit(args),
    }
}

fn print_commands() -> Result<()> {
    let rows = vec![
        json!({
            "name": "capture",
            "description": "Capture the visible area and stash it for the editor.",
        }),
        json!({
            "name": "edit",
            "description": "Replay an annotation script and export the result.",
        }),
    ];

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "commands": rows }))?
    );
    Ok(())
}

fn command_capture(args: CaptureArgs) -> Result<()> {
    let page = PageInfo {
        url: args.url.clone(),
        title: args.title.clone(),
        capture_mode: CaptureMode::Visible,
    };

    let provider: Box<dyn CaptureProvider> = match (&args.image, &args.command) {
        (Some(path), _) => {
            if !path.exists() {
                bail!("input not found: {}", path.display());
            }
            Box::new(FileCapture {
                path: path.clone(),
                page,
            })
        }
        (None, Some(program)) => {
            let mut capture = CommandCapture::new(program.clone(), args.command_args.clone(), page);
            capture.timeout = Duration::from_secs(args.timeout_secs.max(1));
            Box::new(capture)
        }
        (None, None) => bail!("capture needs --image or --command"),
    };

    let captured = capture_page(provider.as_ref(), &args.mode)
        .context("capture failed; no editor session started")?;

    let store_path = args.store.unwrap_or_else(default_store_path);
    let mut store = JsonFileStore::new(&store_path);
    stash_capture(&mut store, &captured)
        .with_context(|| format!("failed to write hand-off store: {}", store_path.display()))?;

    if args.json {
        let payload = json!({
            "store_path": abs_path(&store_path).display().to_string(),
            "width": captured.width,
            "height": captured.height,
            "page": captured.page,
        });
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        println!("{}", abs_path(&store_path).display());
    }
    Ok(())
}

fn command_edit(args: EditArgs) -> Result<()> {
    if args.script_help {
        println!("{}", SCRIPT_HELP.trim());
        return Ok(());
    }

    let mut config = EditorConfig::load_or_default(args.config.as_deref())
        .context("failed to load editor config")?;
    if let Some(dir) = &args.out_dir {
        config.output_dir = dir.clone();
    }
    let out_dir = config.output_dir.clone();

    let script = match &args.script {
        Some(path) => load_script(path)?,
        None => Script {
            viewport: None,
            actions: Vec::new(),
        },
    };
    let viewport = args
        .viewport
        .or(script.viewport)
        .unwrap_or(Viewport::new(1280, 800));

    let mut editor = match &args.image {
        Some(path) => {
            let image = image::open(path)
                .with_context(|| format!("failed to open input image: {}", path.display()))?
                .to_rgba8();
            Editor::new(image, viewport, config)?
        }
        None => {
            let store_path = args.store.clone().unwrap_or_else(default_store_path);
            let store = JsonFileStore::new(&store_path);
            Editor::from_store(&store, viewport, config)
                .with_context(|| format!("failed to open capture from {}", store_path.display()))?
        }
    };

    let mut sink = DirectorySink::new(&out_dir);
    let uploader = args
        .upload_dir
        .clone()
        .map(|root| FolderUploader { root });
    let mut exports: Vec<Value> = Vec::new();

    for (idx, action) in script.actions.into_iter().enumerate() {
        log::debug!("action #{idx}: {action:?}");
        match action {
            Action::Tool { tool } => editor
                .select_tool(tool)
                .with_context(|| format!("action #{idx}"))?,
            Action::Color { color } => editor
                .select_color(color)
                .with_context(|| format!("action #{idx}"))?,
            Action::Drag {
                from,
                to,
                space,
                steps,
                leave,
            } => {
                let start = to_screen(&editor, from, space);
                let end = to_screen(&editor, to, space);
                editor.pointer_down(start);
                let steps = steps.clamp(1, MAX_DRAG_STEPS);
                for step in 1..=steps {
                    let t = f64::from(step) / f64::from(steps);
                    editor.pointer_move(Point::new(
                        start.x + (end.x - start.x) * t,
                        start.y + (end.y - start.y) * t,
                    ));
                }
                if leave {
                    editor.pointer_leave(end);
                } else {
                    editor.pointer_up(end);
                }
            }
            Action::Text {
                at,
                value,
                space,
                commit,
            } => {
                editor.pointer_down(to_screen(&editor, at, space));
                editor.set_text(&value);
                match commit {
                    TextCommit::Enter => editor.text_key(TextKey::Enter),
                    TextCommit::Escape => editor.text_key(TextKey::Escape),
                    TextCommit::Blur => {
                        let now = Instant::now();
                        let grace = Duration::from_millis(editor.config().text_commit_grace_ms);
                        editor.text_blur(now);
                        editor.tick(now + grace);
                    }
                }
            }
            Action::Undo => {
                editor.undo();
            }
            Action::Resize { width, height } => editor.resize(Viewport::new(width, height)),
            Action::Frame { out } => {
                let path = if out.is_absolute() { out } else { out_dir.join(out) };
                ensure_parent_dir(&path)?;
                editor
                    .frame()
                    .save(&path)
                    .with_context(|| format!("failed to save frame: {}", path.display()))?;
                exports.push(json!({"kind": "frame", "path": abs_path(&path).display().to_string()}));
            }
            Action::Download => {
                if let Ok(path) = editor.download(&mut sink) {
                    if !args.no_meta {
                        let (w, h) = editor.image().dimensions();
                        ExportMeta::new(
                            &abs_path(&path),
                            w,
                            h,
                            editor.page().cloned(),
                            editor.annotations().to_vec(),
                        )
                        .write_beside(&path)?;
                    }
                    exports.push(json!({"kind": "download", "path": abs_path(&path).display().to_string()}));
                }
            }
            Action::Copy => {
                if editor.copy_to_clipboard(&mut SystemClipboard).is_ok() {
                    exports.push(json!({"kind": "clipboard"}));
                }
            }
            Action::Upload => match &uploader {
                Some(uploader) => {
                    if let Ok(receipt) = editor.upload_export(uploader) {
                        exports.push(json!({
                            "kind": "upload",
                            "file_name": receipt.file_name,
                            "share_link": receipt.share_link,
                        }));
                    }
                }
                None => log::warn!("action #{idx}: upload skipped, no --upload-dir given"),
            },
        }
    }

    let notifications: Vec<Value> = editor
        .take_notifications()
        .into_iter()
        .map(|note| {
            let kind = match note.kind {
                NotificationKind::Success => "success",
                NotificationKind::Error => "error",
            };
            if note.kind == NotificationKind::Error {
                eprintln!("{}", note.message);
            }
            json!({"kind": kind, "message": note.message})
        })
        .collect();

    let (img_w, img_h) = editor.image().dimensions();
    let (canvas_w, canvas_h) = editor.canvas_size();
    let summary = json!({
        "image_size": {"width": img_w, "height": img_h, "units": "px"},
        "canvas_size": {"width": canvas_w, "height": canvas_h, "units": "px"},
        "scale": editor.scale(),
        "page": editor.page(),
        "annotations": editor.annotations().to_vec(),
        "history_len": editor.history_len(),
        "exports": exports,
        "notifications": notifications,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn to_screen(editor: &Editor, [x, y]: [f64; 2], space: Space) -> Point {
    let point = Point::new(x, y);
    match space {
        Space::Image => point.to_display(editor.scale()),
        Space::Screen => point,
    }
}

fn load_script(path: &str) -> Result<Script> {
    let raw = if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read script from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read script file: {path}"))?
    };

    let value: Value = serde_json::from_str(&raw).context("invalid script JSON")?;
    match value {
        Value::Array(_) => Ok(Script {
            viewport: None,
            actions: serde_json::from_value(value).context("invalid script action")?,
        }),
        Value::Object(ref obj) => {
            if obj.get("actions").is_none() {
                bail!("script must be a list or an object with 'actions'");
            }
            serde_json::from_value(value).context("invalid script action")
        }
        _ => bail!("script must be a list or an object with 'actions'"),
    }
}

fn parse_viewport(raw: &str) -> std::result::Result<Viewport, String> {
    let (w, h) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw}"))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok(Viewport::new(width, height))
}

fn default_store_path() -> PathBuf {
    quickshot::config::default_output_dir().join("store.json")
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn abs_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}
