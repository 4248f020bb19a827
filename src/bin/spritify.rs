use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use spritify::{
    ImageMagickTools, RenderComplete, Rgba, SpriteSheetInvoker, SpriteSheetSettings,
    SystemRunner, TileSize, Tool, ViewArtifacts,
};

#[derive(Parser, Debug)]
#[command(name = "spritify", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the sprite sheet and/or GIF from a render output directory.
    Generate(RenderArgs),
    /// Render-completion hook: like `generate`, but does nothing when auto_run is off.
    Hook(RenderArgs),
    /// Print the ImageMagick command lines without running them.
    Plan(RenderArgs),
    /// Check that the ImageMagick binaries can be found.
    Check(SettingsArgs),
    /// Print the effective settings as JSON.
    Config(SettingsArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Directory containing the rendered frames.
    render_dir: PathBuf,

    /// View suffix of a multiview render (repeatable, e.g. --view _L --view _R).
    #[arg(long = "view")]
    views: Vec<String>,

    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Settings JSON file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for the generated files.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Sprite sheet file name (the GIF reuses its stem).
    #[arg(long)]
    filename: Option<String>,

    #[arg(long)]
    columns: Option<u32>,

    #[arg(long)]
    rows: Option<u32>,

    /// Gap between tiles in pixels.
    #[arg(long)]
    padding: Option<u32>,

    /// Background fill: #RRGGBB[AA], "transparent" or r,g,b[,a] in 0..1.
    #[arg(long)]
    background: Option<Rgba>,

    /// Fixed tile size, e.g. 64x64.
    #[arg(long)]
    tile_size: Option<TileSize>,

    /// Sprite sheet quality (0-100).
    #[arg(long)]
    quality: Option<u8>,

    /// Split frames across this many sheet files.
    #[arg(long)]
    sheets: Option<u32>,

    /// Skip the sprite sheet.
    #[arg(long)]
    no_sheet: bool,

    /// Also build the animated GIF.
    #[arg(long, conflicts_with = "no_gif")]
    gif: bool,

    /// Skip the animated GIF.
    #[arg(long)]
    no_gif: bool,

    /// GIF frame delay in centiseconds.
    #[arg(long)]
    gif_delay: Option<u32>,

    /// GIF loop count (0 = forever).
    #[arg(long)]
    gif_loop: Option<u32>,

    /// Directory containing the ImageMagick binaries (default: search PATH).
    #[arg(long)]
    imagemagick_dir: Option<PathBuf>,

    /// Extension of the rendered frames.
    #[arg(long)]
    frame_ext: Option<String>,

    /// Ignore views and build one artifact set.
    #[arg(long)]
    no_multiview: bool,
}

impl SettingsArgs {
    fn resolve(self) -> anyhow::Result<SpriteSheetSettings> {
        let mut s = match &self.config {
            Some(path) => SpriteSheetSettings::from_json_path(path)?,
            None => SpriteSheetSettings::default(),
        };

        if let Some(v) = self.out_dir {
            s.output_dir = v;
        }
        if let Some(v) = self.filename {
            s.filename = v;
        }
        if let Some(v) = self.columns {
            s.columns = v;
        }
        if let Some(v) = self.rows {
            s.rows = v;
        }
        if let Some(v) = self.padding {
            s.padding = v;
        }
        if let Some(v) = self.background {
            s.background = v;
        }
        if let Some(v) = self.tile_size {
            s.tile_size = Some(v);
        }
        if let Some(v) = self.quality {
            s.quality = v;
        }
        if let Some(v) = self.sheets {
            s.sheet_count = v;
        }
        if self.no_sheet {
            s.make_sheet = false;
        }
        if self.gif {
            s.make_gif = true;
        }
        if self.no_gif {
            s.make_gif = false;
        }
        if let Some(v) = self.gif_delay {
            s.gif_delay = v;
        }
        if let Some(v) = self.gif_loop {
            s.gif_loop = v;
        }
        if let Some(v) = self.imagemagick_dir {
            s.imagemagick_dir = Some(v);
        }
        if let Some(v) = self.frame_ext {
            s.frame_extension = v;
        }
        if self.no_multiview {
            s.multiview = false;
        }

        s.validate()?;
        Ok(s)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Command::Generate(args) => cmd_render(args, false),
        Command::Hook(args) => cmd_render(args, true),
        Command::Plan(args) => cmd_plan(args),
        Command::Check(args) => cmd_check(args),
        Command::Config(args) => cmd_config(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_render(args: RenderArgs, respect_auto_run: bool) -> anyhow::Result<()> {
    let settings = args.settings.resolve()?;
    let event = RenderComplete::new(args.render_dir).with_views(args.views);
    let invoker = SpriteSheetInvoker::new(SystemRunner);

    let results = if respect_auto_run {
        spritify::on_render_complete(&invoker, &settings, &event)?
    } else {
        spritify::run_render_complete(&invoker, &settings, &event)?
    };

    if results.is_empty() {
        eprintln!("auto_run is disabled; nothing generated");
    }
    for ViewArtifacts { artifacts, .. } in &results {
        for path in artifacts.paths() {
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn cmd_plan(args: RenderArgs) -> anyhow::Result<()> {
    let settings = args.settings.resolve()?;
    let event = RenderComplete::new(args.render_dir).with_views(args.views);
    let invoker = SpriteSheetInvoker::new(SystemRunner);

    for view in event.view_suffixes(settings.multiview) {
        let frames = spritify::discover_frames_filtered(
            &event.render_dir,
            &view,
            &settings.frame_extension,
            |p| settings.is_artifact(p, &view),
        )
        .with_context(|| format!("collect frames in '{}'", event.render_dir.display()))?;
        for inv in invoker.plan(&settings, &frames, &view)? {
            println!("{inv}");
        }
    }
    Ok(())
}

fn cmd_check(args: SettingsArgs) -> anyhow::Result<()> {
    use spritify::ProcessRunner as _;

    let settings = args.resolve()?;
    let tools = ImageMagickTools::from_settings(&settings);
    let mut missing = Vec::new();
    for tool in [Tool::Montage, Tool::Convert] {
        let program = tools.program(tool);
        if SystemRunner.is_available(&program) {
            eprintln!("found {}", program.display());
        } else {
            eprintln!("missing {}", program.display());
            missing.push(program);
        }
    }
    if let Some(first) = missing.into_iter().next() {
        return Err(spritify::SpritifyError::binary_not_found(first).into());
    }
    Ok(())
}

fn cmd_config(args: SettingsArgs) -> anyhow::Result<()> {
    let settings = args.resolve()?;
    println!("{}", settings.to_json_pretty()?);
    Ok(())
}
