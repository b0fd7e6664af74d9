mod ui;

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::bail;
use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fytlo_core::actions::UserAction;
use fytlo_core::config::Config;
use fytlo_core::messages;
use fytlo_core::persistence::load_auto_save_preference;
use fytlo_core::persistence::store_auto_save_preference;
use fytlo_core::persistence::FilePreferenceStore;
use fytlo_core::state::AutoSavePreference;
use fytlo_core::state::GarmentSlot;
use fytlo_core::state::PickSource;
use fytlo_core::state::PickTarget;
use fytlo_core::state::ToastId;
use fytlo_exec::contracts::ImagePicker;
use fytlo_exec::photos::DirectoryPhotoLibrary;
use fytlo_exec::picker::FilePicker;
use fytlo_exec::runtime::SessionRuntime;

const SAVE_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "fytlo", version, about = "Try on outfits from a full-body photo")]
struct Cli {
    /// Config file (defaults to config.toml in the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one try-on without the terminal UI.
    TryOn(TryOnArgs),
    /// Inspect or reset the stored auto-save preference.
    Prefs {
        #[command(subcommand)]
        action: PrefsCommand,
    },
}

#[derive(Debug, clap::Args)]
struct TryOnArgs {
    #[arg(long)]
    body: PathBuf,
    #[arg(long)]
    top: Option<PathBuf>,
    #[arg(long)]
    bottom: Option<PathBuf>,
    /// Answer to the auto-save prompt. Asked interactively when omitted.
    #[arg(long, value_enum)]
    auto_save: Option<Answer>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Answer {
    Yes,
    No,
}

#[derive(Debug, Subcommand)]
enum PrefsCommand {
    Show,
    Reset,
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None => {
            let log_path = data_dir()?.join("fytlo.log");
            init_logging(LogTarget::File(log_path))?;
            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            let session = build_session(config, &runtime)?;
            ui::run(session).map_err(|err| anyhow::anyhow!("terminal ui: {err}"))
        }
        Some(Command::TryOn(args)) => {
            init_logging(LogTarget::Stderr)?;
            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            let session = build_session(config, &runtime)?;
            runtime.block_on(try_on(session, args))
        }
        Some(Command::Prefs { action }) => {
            init_logging(LogTarget::Stderr)?;
            prefs(&config, action)
        }
    }
}

fn init_logging(target: LogTarget) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init()?,
        LogTarget::File(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?
        }
    }
    Ok(())
}

fn data_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("no data directory on this platform")?
        .join("fytlo");
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match dirs::config_dir() {
            Some(dir) => dir.join("fytlo").join("config.toml"),
            None => return Ok(Config::default()),
        },
    };
    Config::load(&path).with_context(|| format!("loading config {}", path.display()))
}

fn preferences_path(config: &Config) -> anyhow::Result<PathBuf> {
    match &config.storage.preferences_path {
        Some(path) => Ok(path.clone()),
        None => Ok(data_dir()?.join("preferences.json")),
    }
}

fn photo_library_dir(config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &config.storage.photo_library_dir {
        return Ok(dir.clone());
    }
    let pictures = dirs::picture_dir()
        .or_else(dirs::home_dir)
        .context("no pictures directory on this platform")?;
    Ok(pictures.join("Fytlo"))
}

fn build_session(config: Config, runtime: &tokio::runtime::Runtime) -> anyhow::Result<SessionRuntime> {
    let prefs_path = preferences_path(&config)?;
    let store = FilePreferenceStore::open(&prefs_path)
        .with_context(|| format!("opening preferences {}", prefs_path.display()))?;
    let library = DirectoryPhotoLibrary::new(
        photo_library_dir(&config)?,
        config.storage.photo_authorization,
        config.storage.photo_request_grants,
    );
    tracing::debug!(
        preferences = %prefs_path.display(),
        library = %library.dir().display(),
        "session storage resolved"
    );
    Ok(SessionRuntime::new(
        config,
        Box::new(store),
        Arc::new(library),
        runtime.handle().clone(),
    ))
}

/// Prints each toast once as it appears.
struct ToastEcho {
    last: ToastId,
}

impl ToastEcho {
    fn new(session: &SessionRuntime) -> Self {
        Self {
            last: session.state().toast.id,
        }
    }

    fn echo(&mut self, session: &SessionRuntime) {
        let toast = &session.state().toast;
        if toast.is_visible && toast.id != self.last {
            println!("» {}", toast.message);
        }
        self.last = toast.id;
    }
}

async fn try_on(mut session: SessionRuntime, args: TryOnArgs) -> anyhow::Result<()> {
    let picker = FilePicker;
    let mut echo = ToastEcho::new(&session);

    session.dispatch(UserAction::GoToBodyUpload);
    session.dispatch(UserAction::PickerFinished {
        target: PickTarget::Body,
        outcome: picker.pick(PickSource::Library, Some(&args.body)),
    });
    echo.echo(&session);
    if session.state().body_image.is_none() {
        bail!("body photo {} was not accepted", args.body.display());
    }

    session.dispatch(UserAction::ContinueFromBodyUpload);
    let garments = [(GarmentSlot::Top, &args.top), (GarmentSlot::Bottom, &args.bottom)];
    for (slot, path) in garments {
        let Some(path) = path else { continue };
        session.dispatch(UserAction::PickerFinished {
            target: PickTarget::Garment(slot),
            outcome: picker.pick(PickSource::Library, Some(path)),
        });
        echo.echo(&session);
    }

    session.dispatch(UserAction::Generate);
    echo.echo(&session);
    if !session.state().is_generating {
        bail!("nothing to generate");
    }
    println!("generating...");
    while session.state().is_generating {
        if !session.next_event().await {
            bail!("runtime stopped before generation finished");
        }
    }

    let Some(result) = session.state().result_image.clone() else {
        bail!("generation produced no result");
    };
    println!("result: {}", result.origin().display());

    if session.state().show_auto_save_prompt {
        let enabled = match args.auto_save {
            Some(answer) => matches!(answer, Answer::Yes),
            None => prompt_auto_save()?,
        };
        session.dispatch(UserAction::AnswerAutoSavePrompt { enabled });
    }

    if session.state().auto_save_preference == AutoSavePreference::Enabled {
        let waited = tokio::time::timeout(SAVE_WAIT, async {
            while !save_settled(&session) {
                if !session.next_event().await {
                    break;
                }
            }
        })
        .await;
        if waited.is_err() {
            tracing::warn!("timed out waiting for the photo library");
        }
        echo.echo(&session);
    }
    Ok(())
}

fn save_settled(session: &SessionRuntime) -> bool {
    let toast = &session.state().toast;
    toast.is_visible
        && [
            messages::SAVED,
            messages::SAVE_FAILED,
            messages::SAVE_PERMISSION_NEEDED,
        ]
        .contains(&toast.message.as_str())
}

fn prompt_auto_save() -> io::Result<bool> {
    print!("Auto-save results to Photos? [y/N]: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}

fn prefs(config: &Config, action: PrefsCommand) -> anyhow::Result<()> {
    let path = preferences_path(config)?;
    let mut store = FilePreferenceStore::open(&path)
        .with_context(|| format!("opening preferences {}", path.display()))?;
    match action {
        PrefsCommand::Show => {
            let preference = load_auto_save_preference(&store);
            println!("auto-save: {}", preference.label());
            println!("file: {}", store.path().display());
        }
        PrefsCommand::Reset => {
            store_auto_save_preference(&mut store, AutoSavePreference::Unknown)?;
            println!("auto-save preference reset; you will be asked after the next try-on");
        }
    }
    Ok(())
}
