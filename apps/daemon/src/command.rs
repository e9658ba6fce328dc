//! Console commands - one line of stdin, parsed.

use mosaic_signals::DataType;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add { kind: String },
    Remove { id: String },
    Connect { source: String, sink: String },
    Disconnect { source: String, sink: String },
    Publish { id: String, data_type: DataType, content: String },
    Clear { id: String },
    /// Latest payload visible to a consumer
    Read { id: String },
    Sources { id: String },
    Schema,
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  list                                  show tiles and their targets
  add <kind>                            add a tile (kind 'clock' publishes the time)
  remove <id>                           remove a tile and its output
  connect <source> <sink>               route source's output to sink
  disconnect <source> <sink>            undo a connect
  publish <id> <text|audio|json> <content>
  clear <id>                            drop a tile's output
  read <id>                             latest payload reaching a tile
  sources <id>                          tiles that target a tile
  schema                                print the snapshot JSON schema
  save                                  write the tile list to disk
  quit";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let (name, rest) = next_word(line).ok_or_else(|| anyhow::anyhow!("empty command"))?;
        let mut args = Args { command: name, rest };

        let command = match name.to_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "add" => Command::Add {
                kind: args.word("kind")?,
            },
            "remove" | "rm" => Command::Remove { id: args.word("id")? },
            "connect" => Command::Connect {
                source: args.word("source")?,
                sink: args.word("sink")?,
            },
            "disconnect" => Command::Disconnect {
                source: args.word("source")?,
                sink: args.word("sink")?,
            },
            "publish" | "pub" => {
                let id = args.word("id")?;
                let data_type: DataType = args.word("data type")?.parse()?;
                let content = args.remainder("content")?;
                if data_type == DataType::Json {
                    serde_json::from_str::<serde_json::Value>(&content)
                        .map_err(|e| anyhow::anyhow!("json content does not parse: {e}"))?;
                }
                Command::Publish {
                    id,
                    data_type,
                    content,
                }
            }
            "clear" => Command::Clear { id: args.word("id")? },
            "read" => Command::Read { id: args.word("id")? },
            "sources" => Command::Sources { id: args.word("id")? },
            "schema" => Command::Schema,
            "save" => Command::Save,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => anyhow::bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(command)
    }
}

struct Args<'a> {
    command: &'a str,
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn word(&mut self, what: &str) -> anyhow::Result<String> {
        let (word, rest) = next_word(self.rest)
            .ok_or_else(|| anyhow::anyhow!("{}: missing <{}>", self.command, what))?;
        self.rest = rest;
        Ok(word.to_string())
    }

    /// Everything left on the line, inner whitespace preserved.
    fn remainder(&mut self, what: &str) -> anyhow::Result<String> {
        let rest = self.rest.trim();
        if rest.is_empty() {
            anyhow::bail!("{}: missing <{}>", self.command, what);
        }
        self.rest = "";
        Ok(rest.to_string())
    }
}

fn next_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], s[end..].trim_start())),
        None => Some((s, "")),
    }
}
