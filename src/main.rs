//! Application entry point — Aozora reader console front end.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run; a
//!    malformed file is a warning, not a failure).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers) for fetch tasks.
//! 4. Build the engine wrapper and enumerate voices (degrades to the
//!    fallback list when the engine is unreachable).
//! 5. Run the interactive command loop until `quit`.
//!
//! The presentation layer is deliberately minimal — every capability lives
//! in the library crate and any UI technology could drive it instead.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use aozora_reader::{
    config::{AppConfig, ParamFamily},
    engine::{SeikaConsole, SpeakRequest, SpeechEngine, Voice},
    fetch::{read_local_document, spawn_fetch, AozoraFetcher, Document, FetchEvent, TextFetcher},
    playback::{PlaybackController, PlaybackEvent},
    text::split_into_chunks,
};

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Aozora reader starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (fetch tasks only — playback runs on its own thread)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Engine + voices
    let console = SeikaConsole::new(
        &config.engine_path,
        Duration::from_secs_f64(config.interval),
    );
    let voices = console.list_voices();
    log::info!("{} voices available", voices.len());

    // 5. Command loop
    let mut app = ReaderApp::new(config, console, voices, rt);
    app.run()
}

// ---------------------------------------------------------------------------
// ReaderApp
// ---------------------------------------------------------------------------

/// Console orchestrator: owns the config, the engine wrapper, the fetched
/// document and the playback controller.
struct ReaderApp {
    config: AppConfig,
    console: SeikaConsole,
    voices: Vec<Voice>,
    rt: tokio::runtime::Runtime,
    document: Option<Document>,
    chunks: Vec<String>,
    controller: PlaybackController,
}

impl ReaderApp {
    fn new(
        config: AppConfig,
        console: SeikaConsole,
        voices: Vec<Voice>,
        rt: tokio::runtime::Runtime,
    ) -> Self {
        let engine: Arc<dyn SpeechEngine> = Arc::new(console.clone());
        Self {
            config,
            console,
            voices,
            rt,
            document: None,
            chunks: Vec::new(),
            controller: PlaybackController::new(engine),
        }
    }

    fn run(&mut self) -> Result<()> {
        println!("aozora-reader — type `help` for commands");
        let stdin = std::io::stdin();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                break; // EOF
            }
            let mut parts = line.split_whitespace();
            let Some(command) = parts.next() else {
                continue;
            };
            let rest: Vec<&str> = parts.collect();

            let result = match command {
                "help" => {
                    print_help();
                    Ok(())
                }
                "fetch" => self.cmd_fetch(&rest),
                "open" => self.cmd_open(&rest),
                "voices" => self.cmd_voices(),
                "voice" => self.cmd_voice(&rest),
                "params" => self.cmd_params(),
                "set" => self.cmd_set(&rest),
                "chunksize" => self.cmd_chunksize(&rest),
                "interval" => self.cmd_interval(&rest),
                "play" => self.cmd_play(),
                "pause" => {
                    self.controller.pause();
                    Ok(())
                }
                "resume" => {
                    self.controller.resume();
                    Ok(())
                }
                "stop" => {
                    self.controller.stop();
                    Ok(())
                }
                "save" => self.cmd_save(),
                "quit" | "exit" => break,
                other => {
                    println!("unknown command: {other} (try `help`)");
                    Ok(())
                }
            };

            // Nothing is fatal: surface the message and keep the loop alive.
            if let Err(e) = result {
                println!("error: {e:#}");
            }
        }

        self.controller.stop_and_wait();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Text acquisition
    // -----------------------------------------------------------------------

    fn cmd_fetch(&mut self, args: &[&str]) -> Result<()> {
        let url = args.first().copied().unwrap_or_default().to_string();

        let fetcher: Arc<dyn TextFetcher> = Arc::new(AozoraFetcher::new());
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);

        // Empty URLs are rejected here, before any task starts. The enter
        // guard must be dropped before block_on below.
        {
            let _guard = self.rt.enter();
            let _task = spawn_fetch(fetcher, url.clone(), tx)?;
        }

        println!("fetching…");
        match self.rt.block_on(rx.recv()) {
            Some(FetchEvent::Completed { document }) => {
                println!("{} / {}", document.title, document.author);
                self.config.url = Some(url);
                self.set_document(document);
                Ok(())
            }
            Some(FetchEvent::Failed { message }) => bail!("fetch failed: {message}"),
            None => bail!("fetch task ended without a result"),
        }
    }

    fn cmd_open(&mut self, args: &[&str]) -> Result<()> {
        let Some(path) = args.first() else {
            bail!("usage: open <file>");
        };
        let path = std::path::PathBuf::from(path);
        let document = read_local_document(&path)?;
        println!("{} ({} chars)", document.title, document.text.chars().count());
        self.config.file_path = Some(path);
        self.set_document(document);
        Ok(())
    }

    fn set_document(&mut self, document: Document) {
        self.chunks = split_into_chunks(&document.text, self.config.chunk_size);
        println!("{} chunks of ≤{} chars", self.chunks.len(), self.config.chunk_size);
        self.document = Some(document);
    }

    // -----------------------------------------------------------------------
    // Voice selection and tuning
    // -----------------------------------------------------------------------

    fn cmd_voices(&self) -> Result<()> {
        for voice in &self.voices {
            match voice.channel_id {
                Some(cid) => println!("{cid:>6}  {}", voice.name),
                None => println!("     -  {} (engine offline)", voice.name),
            }
        }
        Ok(())
    }

    fn cmd_voice(&mut self, args: &[&str]) -> Result<()> {
        let name = args.join(" ");
        if name.is_empty() {
            bail!("usage: voice <name>");
        }
        let Some(voice) = self.voices.iter().find(|v| v.name == name) else {
            bail!("unknown voice: {name}");
        };

        self.config.voice = Some(voice.name.clone());

        // Fold the engine-reported ranges into the profile; previously tuned
        // values survive (clamped to the fresh range).
        if let Some(cid) = voice.channel_id {
            let params = self.console.query_params(cid)?;
            for p in &params {
                self.config.profiles.apply_discovered(
                    &name, &p.name, p.family, p.default, p.min, p.max, p.step,
                );
            }
            println!("{} parameters discovered", params.len());
        } else {
            println!("no channel id for {name}; parameters unavailable");
        }
        Ok(())
    }

    fn cmd_params(&self) -> Result<()> {
        let Some(voice) = self.config.voice.as_deref() else {
            bail!("no voice selected");
        };
        let Some(profile) = self.config.profiles.profile(voice) else {
            bail!("no parameters discovered for {voice}");
        };

        for (name, p) in &profile.effects {
            println!(
                "effect  {name} = {} [{} .. {}]",
                p.display_value(),
                p.min as f64 / p.scale,
                p.max as f64 / p.scale
            );
        }
        for (name, p) in &profile.emotions {
            println!(
                "emotion {name} = {} [{} .. {}]",
                p.display_value(),
                p.min as f64 / p.scale,
                p.max as f64 / p.scale
            );
        }
        Ok(())
    }

    fn cmd_set(&mut self, args: &[&str]) -> Result<()> {
        let [family, name, raw] = args else {
            bail!("usage: set <effect|emotion> <name> <integer value>");
        };
        let family = match *family {
            "effect" => ParamFamily::Effect,
            "emotion" => ParamFamily::Emotion,
            other => bail!("unknown family: {other}"),
        };
        let raw: i64 = raw.parse().context("value must be an integer")?;
        let Some(voice) = self.config.voice.clone() else {
            bail!("no voice selected");
        };

        if !self.config.profiles.set_value(&voice, name, family, raw) {
            bail!("parameter {name} has not been discovered for {voice}");
        }
        let display = self
            .config
            .profiles
            .display_value(&voice, name, family)
            .unwrap_or_default();
        println!("{name} = {display}");
        Ok(())
    }

    fn cmd_chunksize(&mut self, args: &[&str]) -> Result<()> {
        let size: usize = args
            .first()
            .context("usage: chunksize <chars>")?
            .parse()
            .context("chunk size must be a positive integer")?;
        if size == 0 {
            bail!("chunk size must be at least 1");
        }
        self.config.chunk_size = size;
        if let Some(document) = self.document.take() {
            self.set_document(document);
        }
        Ok(())
    }

    fn cmd_interval(&mut self, args: &[&str]) -> Result<()> {
        let secs: f64 = args
            .first()
            .context("usage: interval <seconds>")?
            .parse()
            .context("interval must be a number")?;
        if !(0.0..=60.0).contains(&secs) {
            bail!("interval must be between 0 and 60 seconds");
        }
        self.config.interval = secs;
        self.console.set_interval(Duration::from_secs_f64(secs));
        // The controller keeps its own engine handle; rebuild it so the new
        // interval applies to the next run.
        self.controller.stop_and_wait();
        self.controller =
            PlaybackController::new(Arc::new(self.console.clone()) as Arc<dyn SpeechEngine>);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    fn cmd_play(&mut self) -> Result<()> {
        if self.chunks.is_empty() {
            bail!("nothing to read — `fetch` or `open` a text first");
        }
        let template = self.build_request()?;

        let (tx, rx) = std::sync::mpsc::channel();
        self.controller.start(self.chunks.clone(), template, tx)?;

        // Progress printer; ends when the run emits Finished.
        std::thread::Builder::new()
            .name("playback-events".into())
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    match event {
                        PlaybackEvent::Speaking { text } => {
                            let preview: String = text.chars().take(40).collect();
                            println!("♪ {preview}");
                        }
                        PlaybackEvent::Progress { position, total } => {
                            println!("  {position}/{total}");
                        }
                        PlaybackEvent::Error { message } => {
                            println!("playback error: {message}");
                        }
                        PlaybackEvent::Finished => {
                            println!("finished");
                            break;
                        }
                    }
                }
            })
            .context("failed to spawn event printer")?;
        Ok(())
    }

    /// Assemble the per-run speak template: channel id plus the tuned
    /// effect/emotion values of the selected voice.
    fn build_request(&self) -> Result<SpeakRequest> {
        let Some(voice) = self.config.voice.as_deref() else {
            bail!("no voice selected — use `voices` and `voice <name>`");
        };
        let Some(cid) = self
            .voices
            .iter()
            .find(|v| v.name == voice)
            .and_then(|v| v.channel_id)
        else {
            bail!("no channel id for {voice} — is the engine running?");
        };

        let mut request = SpeakRequest::new(cid, "");
        if let Some(profile) = self.config.profiles.profile(voice) {
            for (name, p) in &profile.effects {
                request.effects.push((name.clone(), p.display_value()));
            }
            for (name, p) in &profile.emotions {
                request.emotions.push((name.clone(), p.display_value()));
            }
        }
        Ok(request)
    }

    fn cmd_save(&self) -> Result<()> {
        self.config.save()?;
        println!("saved");
        Ok(())
    }
}

fn print_help() {
    println!(
        "\
  fetch <url>          download an Aozora Bunko work page
  open <file>          read a local UTF-8 text file
  voices               list available voices
  voice <name>         select a voice and discover its parameters
  params               show tuned parameters of the selected voice
  set <fam> <n> <v>    set a raw parameter value (effect|emotion)
  chunksize <chars>    re-split the current text with a new chunk size
  interval <seconds>   pause between chunks
  play | pause | resume | stop
  save                 write settings to disk
  quit"
    );
}
