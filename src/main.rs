use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use jaborandi_transp::board;
use jaborandi_transp::schedule::now_minutes;
use jaborandi_transp::theme::DEFAULT_THEME_FILE;
use jaborandi_transp::{
    App, AppEvent, BusLine, ClockTicker, FetchError, LineFilter, LineSource, LineStatus, LoadState, Palette, PendingFetch,
    SourceConfig, StatusFilter, SupabaseSource, ThemePreference, View,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "jaborandi-transp", author, version, about = "Intermunicipal bus timetables", long_about = None)]
struct Cli {
    /// Project URL of the line table
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Public anon key for the line table
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Where the light/dark preference is kept
    #[arg(long, env = "JABORANDI_THEME_FILE", default_value = DEFAULT_THEME_FILE)]
    theme_file: PathBuf,

    /// Disable colors
    #[arg(long)]
    plain: bool,

    /// Defaults to the home page
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Every line with its status
    Home,
    /// List lines, optionally filtered by status and search text
    Lines {
        #[arg(long)]
        status: Option<LineStatus>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show a line's timetable with the next departure highlighted
    Schedule {
        /// Line id (defaults to the first line)
        #[arg(long)]
        line: Option<String>,
        /// Period label (defaults to today's)
        #[arg(long)]
        period: Option<String>,
        /// Keep running and refresh the highlight every minute
        #[arg(long)]
        watch: bool,
    },
    /// Show a line's fares
    Prices {
        #[arg(long)]
        line: Option<String>,
    },
    /// Show a line's stops
    Stops {
        #[arg(long)]
        line: Option<String>,
    },
    /// About this app
    About,
    /// Show or toggle the color theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// Drive the LED stop sign for one line
    #[cfg(feature = "display")]
    Sign {
        #[arg(long)]
        line: Option<String>,
    },
}

// Everything the watch loop reacts to arrives on one channel
enum Input {
    App(AppEvent),
    Command(String),
}

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn spawn_fetch(app: &mut App, source: &Arc<dyn LineSource>, tx: &Sender<Input>) -> PendingFetch {
    let generation = app.begin_fetch();
    let tx = tx.clone();
    PendingFetch::spawn(Arc::clone(source), generation, move |generation, result| {
        let _ = tx.send(Input::App(AppEvent::LinesFetched { generation, result }));
    })
}

// One-shot load for the non-interactive commands
fn load_blocking(app: &mut App, source: &Arc<dyn LineSource>) -> Result<(), FetchError> {
    let (tx, rx) = mpsc::channel();
    let fetch = spawn_fetch(app, source, &tx);
    drop(tx);
    if let Ok(Input::App(event)) = rx.recv() {
        app.apply(event);
    }
    fetch.wait();
    match app.load_state() {
        LoadState::Failed(e) => Err(e.clone()),
        _ => Ok(()),
    }
}

fn print_fetch_failure(e: &FetchError) {
    eprintln!("{}", board::FETCH_FAILED);
    eprintln!("({})", e);
}

fn pick_line(app: &mut App, line: Option<&str>) -> Result<(), String> {
    match line {
        Some(id) => app.choose_line(id).map_err(|e| e.to_string()),
        None => Ok(()),
    }
}

fn render_schedule_page(app: &App, palette: &Palette) -> String {
    match app.board() {
        Ok((line, departures)) => {
            let now = app.schedule().now();
            let mut page = format!("{} · {:02}:{:02}\n\n", View::Schedule.title(), now / 60, now % 60);
            page.push_str(&board::schedule_page(line, app.schedule().period(), &departures, palette));
            page
        }
        Err(_) => format!("{}\n", board::NO_LINE),
    }
}

fn run_watch(
    mut app: App,
    source: Arc<dyn LineSource>,
    mut preference: ThemePreference,
    plain: bool,
    line: Option<String>,
    period: Option<String>,
) -> ExitCode {
    let (tx, rx) = mpsc::channel::<Input>();
    let mut fetch = spawn_fetch(&mut app, &source, &tx);
    app.navigate(View::Schedule);

    let tick_tx = tx.clone();
    let mut ticker = ClockTicker::start(move |now| {
        let _ = tick_tx.send(Input::App(AppEvent::Tick(now)));
    });

    let stdin_tx = tx.clone();
    thread::spawn(move || {
        for input in std::io::stdin().lock().lines() {
            let Ok(input) = input else { break };
            if stdin_tx.send(Input::Command(input.trim().to_string())).is_err() {
                return;
            }
        }
    });

    println!("Comandos: r = tentar novamente, t = tema, l <id> = linha, <período>, q = sair");
    let mut pending_choice = (line, period);

    while let Ok(input) = rx.recv() {
        match input {
            Input::App(event) => {
                let loaded = matches!(event, AppEvent::LinesFetched { .. });
                if matches!(event, AppEvent::Tick(_)) {
                    app.set_today(Local::now().weekday());
                }
                app.apply(event);
                if loaded && *app.load_state() == LoadState::Ready {
                    let (line, period) = std::mem::take(&mut pending_choice);
                    if let Err(e) = pick_line(&mut app, line.as_deref()) {
                        eprintln!("{}", e);
                    }
                    if let Some(Err(e)) = period.map(|period| app.choose_period(&period)) {
                        eprintln!("{}", e);
                    }
                }
            }
            Input::Command(cmd) => match cmd.as_str() {
                "q" => break,
                "r" => {
                    // Retry replaces the previous attempt
                    fetch.cancel();
                    fetch = spawn_fetch(&mut app, &source, &tx);
                }
                "t" => {
                    if let Err(e) = preference.toggle() {
                        eprintln!("{}", e);
                    }
                }
                other => {
                    if let Some(id) = other.strip_prefix("l ") {
                        if let Err(e) = app.choose_line(id.trim()) {
                            eprintln!("{}", e);
                        }
                    } else if !other.is_empty() {
                        if let Err(e) = app.choose_period(other) {
                            eprintln!("{}", e);
                        }
                    }
                }
            },
        }

        let palette = if plain { Palette::PLAIN } else { preference.theme().palette() };
        match app.load_state() {
            LoadState::Loading => println!("Carregando horários..."),
            LoadState::Failed(e) => print_fetch_failure(e),
            LoadState::Ready => print!("\n{}", render_schedule_page(&app, &palette)),
        }
    }

    ticker.stop();
    fetch.cancel();
    info!("Watch stopped");
    ExitCode::SUCCESS
}

#[cfg(feature = "display")]
fn run_sign(mut app: App, source: Arc<dyn LineSource>, line: Option<String>) -> ExitCode {
    use jaborandi_transp::StopSign;

    let mut sign = match StopSign::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ Failed to initialize display: {}", e);
            eprintln!("  Make sure you're running on a Raspberry Pi with proper permissions.");
            return ExitCode::FAILURE;
        }
    };
    let (width, height) = sign.dimensions();
    info!(width, height, "Display initialized");

    if let Err(e) = load_blocking(&mut app, &source) {
        print_fetch_failure(&e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = pick_line(&mut app, line.as_deref()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let (tx, rx) = mpsc::channel();
    let mut ticker = ClockTicker::start(move |now| {
        let _ = tx.send(now);
    });

    loop {
        if let Ok((line, departures)) = app.board() {
            sign.render(line, &departures);
        }
        match rx.recv() {
            Ok(now) => {
                app.set_today(Local::now().weekday());
                app.apply(AppEvent::Tick(now));
            }
            Err(_) => break,
        }
    }
    ticker.stop();
    ExitCode::SUCCESS
}

fn line_for<'a>(app: &'a mut App, id: Option<&str>) -> Result<&'a BusLine, String> {
    pick_line(app, id)?;
    app.current_line().map_err(|_| board::NO_LINE.to_string())
}

fn run_once(mut app: App, source: &Arc<dyn LineSource>, command: Commands, palette: &Palette) -> ExitCode {
    if let Err(e) = load_blocking(&mut app, source) {
        print_fetch_failure(&e);
        return ExitCode::FAILURE;
    }

    let output = match command {
        Commands::Home => {
            app.navigate(View::Home);
            let lines: Vec<&BusLine> = app.lines().iter().collect();
            board::page(app.view(), &board::line_list(&lines, palette))
        }
        Commands::Lines { status, search } => {
            app.navigate(View::Lines);
            let status = status.map_or(StatusFilter::All, StatusFilter::Only);
            let filter = LineFilter::new(status, search);
            board::page(app.view(), &board::line_list(&filter.apply(app.lines()), palette))
        }
        Commands::Schedule { line, period, .. } => {
            if let Err(e) = pick_line(&mut app, line.as_deref()) {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
            if let Some(Err(e)) = period.map(|period| app.choose_period(&period)) {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
            render_schedule_page(&app, palette)
        }
        Commands::Prices { line } => match line_for(&mut app, line.as_deref()) {
            Ok(line) => board::prices(line, palette),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        Commands::Stops { line } => match line_for(&mut app, line.as_deref()) {
            Ok(line) => board::stops(line, palette),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        // Theme, about and sign never reach here
        _ => String::new(),
    };
    print!("{}", output);
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    let mut preference = ThemePreference::load(&cli.theme_file);
    let command = cli.command.unwrap_or(Commands::Home);
    if let Commands::Theme { toggle } = &command {
        if *toggle {
            if let Err(e) = preference.toggle() {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
        println!("{}", preference.theme());
        return ExitCode::SUCCESS;
    }

    let palette = if cli.plain { Palette::PLAIN } else { preference.theme().palette() };
    if let Commands::About = command {
        print!("{}", board::page(View::About, &board::about(&palette)));
        return ExitCode::SUCCESS;
    }

    let config = match SourceConfig::new(cli.supabase_url, cli.supabase_key) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let source: Arc<dyn LineSource> = Arc::new(SupabaseSource::new(config));

    let app = App::new(now_minutes(), Local::now().weekday());

    match command {
        Commands::Schedule { line, period, watch: true } => run_watch(app, source, preference, cli.plain, line, period),
        #[cfg(feature = "display")]
        Commands::Sign { line } => run_sign(app, source, line),
        command => run_once(app, &source, command, &palette),
    }
}
