//! Console - drives a dashboard from text commands and a periodic tick.

use crate::command::{Command, HELP};
use chrono::{DateTime, Local};
use mosaic_core::{snapshot_schema, Clock, Dashboard, FlowPayload, Output, Tile};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Tiles of this kind publish the local time on every tick.
pub const CLOCK_KIND: &str = "clock";

pub enum Reply {
    Text(String),
    Quit,
}

pub struct Console<C: Clock> {
    pub dashboard: Dashboard<C>,
    snapshot_path: PathBuf,
}

impl<C: Clock> Console<C> {
    pub fn new(dashboard: Dashboard<C>, snapshot_path: PathBuf) -> Self {
        Self {
            dashboard,
            snapshot_path,
        }
    }

    pub fn execute(&mut self, command: Command) -> anyhow::Result<Reply> {
        let text = match command {
            Command::List => self.render_tiles(),
            Command::Add { kind } => {
                let id = self.dashboard.registry.add_tile(kind);
                format!("added {id}")
            }
            Command::Remove { id } => match self.dashboard.remove_tile(&id) {
                Some(tile) => format!("removed {} ({})", tile.id, tile.kind),
                None => anyhow::bail!("no tile {id}"),
            },
            Command::Connect { source, sink } => {
                self.dashboard.registry.connect(&source, &sink)?;
                format!("{source} -> {sink}")
            }
            Command::Disconnect { source, sink } => {
                if self.dashboard.registry.disconnect(&source, &sink)? {
                    format!("{source} -/> {sink}")
                } else {
                    format!("{source} was not connected to {sink}")
                }
            }
            Command::Publish {
                id,
                data_type,
                content,
            } => {
                if !self.dashboard.registry.contains(&id) {
                    log::warn!("Publishing for unregistered tile '{}'", id);
                }
                let payload = self.dashboard.publish(id, Output::new(content, data_type));
                format!("published {} at {}", payload.data_type, payload.timestamp)
            }
            Command::Clear { id } => match self.dashboard.clear(&id) {
                Some(_) => format!("cleared {id}"),
                None => format!("{id} had no output"),
            },
            Command::Read { id } => match self.dashboard.latest_for(&id) {
                Some(payload) => render_payload(payload),
                None => format!("nothing reaches {id}"),
            },
            Command::Sources { id } => {
                let sources = self.dashboard.sources_for(&id);
                if sources.is_empty() {
                    format!("no tile targets {id}")
                } else {
                    sources
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            }
            Command::Schema => serde_json::to_string_pretty(&snapshot_schema())?,
            Command::Save => {
                self.save()?;
                format!("saved to {}", self.snapshot_path.display())
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Text(text))
    }

    /// Publish `now` from every clock tile. Returns how many published.
    pub fn tick(&mut self, now: DateTime<Local>) -> usize {
        let clocks: Vec<_> = self
            .dashboard
            .registry
            .tiles()
            .iter()
            .filter(|t| t.kind == CLOCK_KIND)
            .map(|t| t.id.clone())
            .collect();
        let stamp = now.format("%H:%M:%S").to_string();
        for id in &clocks {
            self.dashboard.publish(id.clone(), Output::text(stamp.clone()));
        }
        clocks.len()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.dashboard
            .registry
            .snapshot()
            .save_to(&self.snapshot_path)?;
        Ok(())
    }

    fn render_tiles(&self) -> String {
        let tiles = self.dashboard.registry.tiles();
        if tiles.is_empty() {
            return "no tiles".to_string();
        }
        let mut out = String::new();
        for tile in tiles {
            let _ = writeln!(out, "{}", render_tile(tile));
        }
        out.trim_end().to_string()
    }
}

fn render_tile(tile: &Tile) -> String {
    let targets: Vec<&str> = tile.output_targets.iter().map(|t| t.as_str()).collect();
    format!(
        "{} [{}] {}x{}@{},{}{} -> [{}]",
        tile.id,
        tile.kind,
        tile.layout.w,
        tile.layout.h,
        tile.layout.x,
        tile.layout.y,
        if tile.visible { "" } else { " hidden" },
        targets.join(", ")
    )
}

fn render_payload(payload: &FlowPayload) -> String {
    format!(
        "{} @{}: {}",
        payload.data_type, payload.timestamp, payload.content
    )
}

/// Read commands line by line until `quit` or end of input, ticking clock
/// tiles every `tick`. The tile list is saved on the way out.
pub async fn run_session<C, R, W>(
    console: &mut Console<C>,
    reader: R,
    mut writer: W,
    tick: Duration,
) -> anyhow::Result<()>
where
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    log::info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = line
                    .parse::<Command>()
                    .and_then(|command| console.execute(command));
                match reply {
                    Ok(Reply::Text(text)) => {
                        writer.write_all(text.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                    }
                    Ok(Reply::Quit) => break,
                    Err(e) => {
                        writer.write_all(format!("error: {e}\n").as_bytes()).await?;
                    }
                }
                writer.flush().await?;
            }
            _ = ticker.tick() => {
                let published = console.tick(Local::now());
                if published > 0 {
                    log::trace!("Clock tick published from {} tiles", published);
                }
            }
        }
    }

    console.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{DataType, FlowStore, ManualClock, RegistrySnapshot, TileRegistry};

    fn console(path: PathBuf) -> Console<ManualClock> {
        let dashboard = Dashboard::with_store(
            TileRegistry::new(),
            FlowStore::with_clock(ManualClock::new(10)),
        );
        Console::new(dashboard, path)
    }

    fn text(reply: anyhow::Result<Reply>) -> String {
        match reply.unwrap() {
            Reply::Text(t) => t,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_wiring_and_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(dir.path().join("tiles.json"));
        let mic = console.dashboard.registry.add_tile("stt");
        let speaker = console.dashboard.registry.add_tile("tts");

        text(console.execute(Command::Connect {
            source: mic.to_string(),
            sink: speaker.to_string(),
        }));
        text(console.execute(Command::Publish {
            id: mic.to_string(),
            data_type: DataType::Text,
            content: "good morning".into(),
        }));

        let read = text(console.execute(Command::Read {
            id: speaker.to_string(),
        }));
        assert_eq!(read, "text @10: good morning");
        assert_eq!(
            text(console.execute(Command::Sources {
                id: speaker.to_string()
            })),
            mic.to_string()
        );

        text(console.execute(Command::Clear { id: mic.to_string() }));
        let read = text(console.execute(Command::Read {
            id: speaker.to_string(),
        }));
        assert!(read.starts_with("nothing reaches"));
    }

    #[test]
    fn test_errors_surface() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(dir.path().join("tiles.json"));
        assert!(console
            .execute(Command::Remove { id: "ghost".into() })
            .is_err());
        assert!(console
            .execute(Command::Connect {
                source: "a".into(),
                sink: "b".into()
            })
            .is_err());
    }

    #[test]
    fn test_tick_publishes_from_clock_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(dir.path().join("tiles.json"));
        let clock = console.dashboard.registry.add_tile(CLOCK_KIND);
        let notes = console.dashboard.registry.add_tile("notes");
        console
            .dashboard
            .registry
            .connect(clock.as_str(), notes.as_str())
            .unwrap();

        assert_eq!(console.tick(Local::now()), 1);
        let seen = console.dashboard.latest_for(notes.as_str()).unwrap();
        assert_eq!(seen.data_type, DataType::Text);
        assert_eq!(seen.content.len(), "00:00:00".len());
    }

    #[tokio::test]
    async fn test_session_saves_on_quit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.json");
        let mut console = console(path.clone());

        let input: &[u8] = b"add notes\n\nbogus\nlist\nquit\nadd never\n";
        let mut output = Vec::new();
        run_session(&mut console, input, &mut output, Duration::from_secs(3600))
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("added "));
        assert!(output.contains("error: unknown command 'bogus'"));
        assert!(output.contains("[notes]"));
        assert_eq!(console.dashboard.registry.len(), 1);

        let saved = RegistrySnapshot::load_from(&path).unwrap();
        assert_eq!(saved.tiles.len(), 1);
        assert_eq!(saved.tiles[0].kind, "notes");
    }
}
