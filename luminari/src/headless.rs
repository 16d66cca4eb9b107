//! Headless mode for Luminari's Quest.
//!
//! A line-oriented driver that plays encounters in a terminal. It wires the
//! engine to real collaborators: tokio timers for the enemy turn, a logging
//! sound sink, environment configuration and JSON profile saves.

use luminari_core::combat::{CombatLogEntry, CombatPhase};
use luminari_core::persist::{profile_save_path, PersistError};
use luminari_core::ports::{EnemyTurnTicket, LogSoundSink, SystemClock, TokioScheduler};
use luminari_core::progression::Reconciliation;
use luminari_core::{
    shadows, ActionKind, CombatEngine, EnvironmentConfig, ProgressionLedger, SavedCombatProfile,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("Unknown shadow: {0}")]
    UnknownShadow(String),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Options for a headless session.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Shadow to face first.
    pub shadow_id: String,
    /// Profile file loaded on start and written by `#save`.
    pub save_path: Option<PathBuf>,
    /// Seed for reproducible REFLECT heals.
    pub seed: Option<u64>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            shadow_id: "whisper-of-doubt".to_string(),
            save_path: None,
            seed: None,
        }
    }
}

/// Parse session options from command line arguments.
pub fn parse_config_from_args(args: &[String]) -> HeadlessConfig {
    let mut config = HeadlessConfig::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--shadow" => {
                if let Some(id) = args.get(i + 1) {
                    config.shadow_id = id.clone();
                    i += 1;
                }
            }
            "--save" => {
                if let Some(path) = args.get(i + 1) {
                    config.save_path = Some(PathBuf::from(path));
                    i += 1;
                }
            }
            "--profile" => {
                if let Some(name) = args.get(i + 1) {
                    config.save_path = Some(profile_save_path(".", name));
                    i += 1;
                }
            }
            "--seed" => {
                if let Some(seed) = args.get(i + 1) {
                    match seed.parse() {
                        Ok(seed) => config.seed = Some(seed),
                        Err(_) => warn!(%seed, "ignoring invalid --seed"),
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    config
}

/// A player's line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Act(ActionKind),
    Pass,
    Surrender,
    Status,
    Shadows,
    Fight(Option<String>),
    Save(Option<PathBuf>),
    Load(PathBuf),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    if let Some(rest) = line.strip_prefix('#') {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        return match parts.first().copied() {
            Some("quit") | Some("exit") => Command::Quit,
            Some("status") => Command::Status,
            Some("shadows") => Command::Shadows,
            Some("fight") => Command::Fight(parts.get(1).map(|s| s.to_string())),
            Some("save") => Command::Save(parts.get(1).map(PathBuf::from)),
            Some("load") => match parts.get(1) {
                Some(path) => Command::Load(PathBuf::from(path)),
                None => Command::Unknown(line.to_string()),
            },
            Some("help") => Command::Help,
            _ => Command::Unknown(line.to_string()),
        };
    }

    match line.to_ascii_lowercase().as_str() {
        "pass" | "wait" => Command::Pass,
        "surrender" | "retreat" => Command::Surrender,
        other => match other.parse() {
            Ok(action) => Command::Act(action),
            Err(_) => Command::Unknown(line.to_string()),
        },
    }
}

struct Session {
    engine: CombatEngine,
    ledger: ProgressionLedger,
    save_path: Option<PathBuf>,
    printed_log: usize,
}

impl Session {
    fn start(&mut self, shadow_id: &str) -> Result<(), HeadlessError> {
        let shadow =
            shadows::by_id(shadow_id).ok_or_else(|| HeadlessError::UnknownShadow(shadow_id.to_string()))?;
        let resources = self.ledger.game_resources(&SystemClock);
        self.engine.start_combat(shadow, Some(resources));
        self.printed_log = 0;
        self.print_new_log();
        self.print_status();
        Ok(())
    }

    fn print_new_log(&mut self) {
        let log = self.engine.log();
        for entry in &log[self.printed_log.min(log.len())..] {
            print_log_entry(entry);
        }
        self.printed_log = log.len();
    }

    fn print_status(&self) {
        let resources = self.engine.resources();
        println!("[STATUS]");
        if let Some(enemy) = self.engine.enemy() {
            println!("  Shadow: {} ({}/{} HP)", enemy.name, enemy.current_hp, enemy.max_hp);
        }
        println!("  Health: {}/100", self.engine.player_health());
        println!(
            "  LP: {}  SP: {}  Energy: {}/{}{}",
            resources.lp,
            resources.sp,
            self.engine.player_energy(),
            self.engine.max_player_energy(),
            if self.engine.is_low_energy() { " (low)" } else { "" }
        );
        println!("  Turn: {}  Phase: {}", self.engine.turn(), phase_label(self.engine.phase()));

        if self.engine.is_player_turn() && self.engine.is_active() {
            let available: Vec<String> = ActionKind::ALL
                .iter()
                .filter(|a| self.engine.can_use_action(**a))
                .map(|a| a.as_str().to_lowercase())
                .collect();
            println!("  Available: {}", available.join(", "));
        }
        stdout_flush();
    }

    fn print_help(&self) {
        println!("[HELP]");
        for action in ActionKind::ALL {
            let cost = self.engine.action_cost(action);
            let mut parts = Vec::new();
            if let Some(lp) = cost.lp {
                parts.push(format!("{lp} LP"));
            }
            if let Some(sp) = cost.sp {
                parts.push(format!("{sp} SP"));
            }
            if let Some(energy) = cost.energy {
                parts.push(format!("{energy} energy"));
            }
            println!(
                "  {:<10} [{}] {}",
                action.as_str().to_lowercase(),
                parts.join(", "),
                self.engine.action_description(action)
            );
        }
        println!("  pass       - End your turn without acting");
        println!("  surrender  - Retreat from the encounter");
        println!("  #status    - Show the current state");
        println!("  #shadows   - List the shadows you can face");
        println!("  #fight <id>  - Face a shadow once the current encounter is over");
        println!("  #save [path] - Save your profile");
        println!("  #load <path> - Load a profile between encounters");
        println!("  #quit      - Exit");
        stdout_flush();
    }

    /// Report the end of an encounter and pull its results into the ledger.
    fn conclude(&mut self) {
        let status = self.engine.end_status().clone();
        println!();
        println!(
            "[{}] {}",
            if status.victory { "VICTORY" } else { "DEFEAT" },
            status.reason
        );

        match self.ledger.reconcile(&mut self.engine) {
            Ok(reconciliation) => print_reconciliation(&reconciliation, &self.ledger),
            Err(e) => println!("[ERROR] Could not carry results back: {e}"),
        }

        let sync = self.engine.sync_status();
        if !sync.is_valid {
            println!("[SYNC] {} problem(s) recorded this session", sync.errors.len());
        }
        println!("Type #fight <id> to face another shadow, or #quit to exit.");
        stdout_flush();
    }

    async fn save(&self, path: Option<PathBuf>) -> Result<PathBuf, HeadlessError> {
        let path = path
            .or_else(|| self.save_path.clone())
            .unwrap_or_else(|| profile_save_path(".", "luminari"));
        SavedCombatProfile::from_engine(&self.engine)
            .with_progression(self.ledger.clone())
            .save_json(&path)
            .await?;
        info!(path = %path.display(), "profile saved");
        Ok(path)
    }

    async fn load(&mut self, path: PathBuf) -> Result<(), HeadlessError> {
        let saved = SavedCombatProfile::load_json(&path).await?;
        if !self.engine.restore_carried_state(saved.state) {
            println!("[ERROR] Finish the current encounter before loading");
            return Ok(());
        }
        if let Some(ledger) = saved.progression {
            self.ledger = ledger;
        }
        println!("[LOADED] Profile loaded from {}", path.display());
        Ok(())
    }

    /// Returns `false` when the player asked to quit.
    async fn handle(&mut self, command: Command) -> Result<bool, HeadlessError> {
        match command {
            Command::Act(action) => {
                if !self.engine.can_use_action(action) {
                    println!("[ERROR] You cannot {} right now.", action.as_str().to_lowercase());
                } else {
                    self.engine.execute_action(action);
                    self.print_new_log();
                    if self.engine.is_active() {
                        println!("The shadow gathers itself...");
                    }
                }
            }
            Command::Pass => {
                if self.engine.is_active() && self.engine.is_player_turn() {
                    self.engine.end_turn();
                    println!("You hold your ground and wait.");
                } else {
                    println!("[ERROR] It is not your turn.");
                }
            }
            Command::Surrender => self.engine.surrender(),
            Command::Status => self.print_status(),
            Command::Shadows => {
                println!("[SHADOWS]");
                for shadow in shadows::roster() {
                    println!("  {:<20} {} ({} HP)", shadow.id, shadow.name, shadow.max_hp);
                }
            }
            Command::Fight(id) => {
                if self.engine.is_active() {
                    println!("[ERROR] You are already facing a shadow.");
                } else {
                    let id = id.unwrap_or_else(|| "whisper-of-doubt".to_string());
                    if let Err(e) = self.start(&id) {
                        println!("[ERROR] {e}");
                    }
                }
            }
            Command::Save(path) => match self.save(path).await {
                Ok(path) => println!("[SAVED] Profile saved to {}", path.display()),
                Err(e) => println!("[ERROR] Save failed: {e}"),
            },
            Command::Load(path) => {
                if let Err(e) = self.load(path).await {
                    println!("[ERROR] Load failed: {e}");
                }
            }
            Command::Help => self.print_help(),
            Command::Quit => {
                println!("Goodbye. Your light goes with you.");
                return Ok(false);
            }
            Command::Unknown(line) => {
                println!("[ERROR] Unknown command '{line}'. Type #help for help.");
            }
        }
        stdout_flush();
        Ok(true)
    }

    fn on_enemy_turn(&mut self, ticket: EnemyTurnTicket) {
        if self.engine.resolve_enemy_turn(ticket) {
            self.print_new_log();
            if self.engine.is_active() {
                self.print_status();
            }
        }
    }
}

/// Run encounters until the player quits or input ends.
pub async fn run_headless(config: HeadlessConfig) -> Result<(), HeadlessError> {
    let (scheduler, mut due) = TokioScheduler::new(Handle::current());
    let mut engine = CombatEngine::new(EnvironmentConfig::from_env(), Box::new(scheduler))
        .with_sound_sink(Arc::new(LogSoundSink));
    if let Some(seed) = config.seed {
        engine = engine.with_rng_seed(seed);
    }

    let mut session = Session {
        engine,
        ledger: ProgressionLedger::new(),
        save_path: config.save_path.clone(),
        printed_log: 0,
    };

    if let Some(path) = config.save_path.as_ref().filter(|p| p.exists()) {
        session.load(path.clone()).await?;
    }

    println!("=== Luminari's Quest ===");
    println!("Type #help for the list of actions.");
    println!();
    session.start(&config.shadow_id)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut concluded = false;

    loop {
        let keep_going = tokio::select! {
            ticket = due.recv() => match ticket {
                Some(ticket) => {
                    session.on_enemy_turn(ticket);
                    true
                }
                None => false,
            },
            line = next_line(&mut lines) => match line? {
                Some(line) if line.trim().is_empty() => true,
                Some(line) => session.handle(parse_command(line.trim())).await?,
                None => false,
            },
        };

        match session.engine.phase() {
            CombatPhase::Ended { .. } if !concluded => {
                session.conclude();
                concluded = true;
            }
            CombatPhase::PlayerTurn | CombatPhase::EnemyTurn => concluded = false,
            _ => {}
        }

        if !keep_going {
            break;
        }
    }

    Ok(())
}

async fn next_line(lines: &mut Lines<BufReader<Stdin>>) -> io::Result<Option<String>> {
    lines.next_line().await
}

fn print_log_entry(entry: &CombatLogEntry) {
    println!("[{} T{}] {}: {}", entry.actor, entry.turn, entry.action, entry.message);
}

fn print_reconciliation(reconciliation: &Reconciliation, ledger: &ProgressionLedger) {
    let summary = &reconciliation.summary;
    println!("[SUMMARY] {} turns against {}", summary.turns, summary.enemy_name);
    if summary.victory {
        if !summary.growth_message.is_empty() {
            println!("  {}", summary.growth_message);
        }
        println!("  +{} LP, +{} XP", summary.lp_bonus, summary.experience);
    }
    if let Some(favourite) = summary.preferred_actions.favourite() {
        println!("  You leaned on {} the most.", favourite.title());
    }
    if reconciliation.levels_gained > 0 {
        println!("  You reached level {}!", ledger.player_level);
    }
    println!(
        "  Totals: {} LP, {} SP, {} health, {} XP ({} to next level)",
        ledger.light_points,
        ledger.shadow_points,
        ledger.player_health,
        ledger.experience,
        ledger.experience_to_next_level()
    );
}

fn phase_label(phase: CombatPhase) -> &'static str {
    match phase {
        CombatPhase::Idle => "idle",
        CombatPhase::PlayerTurn => "your turn",
        CombatPhase::EnemyTurn => "shadow's turn",
        CombatPhase::Ended { victory: true } => "victory",
        CombatPhase::Ended { victory: false } => "defeat",
    }
}

fn stdout_flush() {
    io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(parse_command("illuminate"), Command::Act(ActionKind::Illuminate));
        assert_eq!(parse_command("EMBRACE"), Command::Act(ActionKind::Embrace));
        assert_eq!(parse_command("pass"), Command::Pass);
        assert_eq!(parse_command("retreat"), Command::Surrender);
        assert!(matches!(parse_command("dance"), Command::Unknown(_)));
    }

    #[test]
    fn test_parse_hash_commands() {
        assert_eq!(parse_command("#quit"), Command::Quit);
        assert_eq!(
            parse_command("#fight veil-of-isolation"),
            Command::Fight(Some("veil-of-isolation".to_string()))
        );
        assert_eq!(parse_command("#save"), Command::Save(None));
        assert_eq!(parse_command("#load a.json"), Command::Load(PathBuf::from("a.json")));
        assert!(matches!(parse_command("#load"), Command::Unknown(_)));
    }

    #[test]
    fn test_parse_args() {
        let args: Vec<String> = ["luminari", "--shadow", "echo-of-past-pain", "--seed", "9", "--save", "me.json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = parse_config_from_args(&args);
        assert_eq!(config.shadow_id, "echo-of-past-pain");
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.save_path, Some(PathBuf::from("me.json")));
    }
}
