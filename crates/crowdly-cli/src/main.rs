//! Crowdly editor in the terminal.
//!
//! A line-oriented front end over the block editor. Each block is addressed
//! by its id (`title-0`, `chapter-1`, `p-3`) or its element id (`block-p-3`).
//!
//! ## Usage
//!
//! ```bash
//! crowdly                      # document in ~/.local/share/crowdly/editor.db
//! crowdly --db story.db        # a different document file
//! crowdly --memory             # scratch document, nothing written to disk
//! RUST_LOG=crowdly=debug crowdly
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crowdly_blocks::{BlockId, BlockKind, BlockPool, strip_markup};
use crowdly_editor::{
    Answer, ContentSurface, DeleteOutcome, Editor, EditorConfig, KvStore, MemoryKv, MemorySurface,
    SqliteKv, TokioUndoScheduler, UndoTicket, wait_until_ready,
};

#[derive(Parser, Debug)]
#[command(name = "crowdly")]
#[command(about = "Block editor for stories: titles, chapters, paragraphs")]
struct Args {
    /// Config file (default: ~/.config/crowdly/editor.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite file holding the document
    #[arg(long, conflicts_with = "memory")]
    db: Option<PathBuf>,

    /// Keep the document in memory only
    #[arg(long)]
    memory: bool,
}

const HELP: &str = r#"COMMANDS:
    list                 Visible blocks in order (* marks the one being edited)
    outline              Blocks grouped by heading
    text                 The document as plain text
    edit <id>            Start editing a block (like clicking it)
    type <text>          Type at the caret of the block being edited
    set <id> <html>      Replace a block's content
    done                 Stop editing (like clicking outside)
    add <id>             New block of the same kind after <id>
    chapter <id>         New chapter + paragraph after <id>'s section
    clone <id>           Copy <id> right after itself
    delete <id>          Delete <id> (chapters take their paragraphs)
    undo                 Restore the last delete
    reset                Start over from the sample document
    dump                 Show the saved JSON
    help                 This text
    quit                 Save and exit"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match args.config.or_else(EditorConfig::default_path) {
        Some(path) => EditorConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    let store = open_store(args.db, args.memory)?;
    let (scheduler, mut expired) = TokioUndoScheduler::new(tokio::runtime::Handle::current());
    let mut editor = Editor::open(config, store, MemorySurface::new(), Box::new(scheduler));
    wait_until_ready(editor.surface(), editor.config().ready_poll()).await;

    println!("{}", editor.plain_text());
    println!("\nType `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    drive(&mut editor, &mut lines, &mut expired).await
}

/// Run the command loop, then end any edit in progress with a save, whether
/// the loop finished cleanly or not.
async fn drive<R: AsyncBufRead + Unpin>(
    editor: &mut Editor<MemorySurface>,
    lines: &mut Lines<R>,
    expired: &mut mpsc::UnboundedReceiver<UndoTicket>,
) -> Result<()> {
    let outcome = repl(editor, lines, expired).await;
    // Same as clicking outside: capture whatever is being typed.
    editor.deactivate();
    outcome
}

async fn repl<R: AsyncBufRead + Unpin>(
    editor: &mut Editor<MemorySurface>,
    lines: &mut Lines<R>,
    expired: &mut mpsc::UnboundedReceiver<UndoTicket>,
) -> Result<()> {
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    return Ok(());
                };
                match parse_command(&line) {
                    Ok(Command::Quit) => return Ok(()),
                    Ok(command) => {
                        if let Err(e) = execute(editor, command, lines).await {
                            println!("! {e:#}");
                        }
                    }
                    Err(message) => println!("! {message}"),
                }
            }
            Some(ticket) = expired.recv() => {
                if editor.expire_undo(ticket) {
                    println!("(undo no longer available)");
                }
            }
        }
    }
}

fn open_store(db: Option<PathBuf>, memory: bool) -> Result<Box<dyn KvStore>> {
    if memory {
        return Ok(Box::new(MemoryKv::new()));
    }
    let Some(path) = db.or_else(EditorConfig::default_db_path) else {
        bail!("no data directory on this platform; pass --db or --memory");
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tracing::debug!(path = %path.display(), "opening document store");
    let store =
        SqliteKv::open(&path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(store))
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Command {
    List,
    Outline,
    Text,
    Edit(BlockId),
    Type(String),
    Set(BlockId, String),
    Done,
    Add(BlockId),
    Chapter(BlockId),
    Clone(BlockId),
    Delete(BlockId),
    Undo,
    Reset,
    Dump,
    Help,
    Quit,
}

/// Accepts `p-3` as well as `block-p-3`.
fn parse_block(arg: &str) -> Result<BlockId, String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err("missing block id".into());
    }
    Ok(BlockId::from_element_id(arg).unwrap_or_else(|| BlockId::from(arg)))
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    let command = match word {
        "list" | "ls" => Command::List,
        "outline" => Command::Outline,
        "text" => Command::Text,
        "edit" => Command::Edit(parse_block(rest)?),
        "type" => Command::Type(rest.to_string()),
        "set" => {
            let (id, html) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Command::Set(parse_block(id)?, html.trim_start().to_string())
        }
        "done" => Command::Done,
        "add" => Command::Add(parse_block(rest)?),
        "chapter" => Command::Chapter(parse_block(rest)?),
        "clone" => Command::Clone(parse_block(rest)?),
        "delete" | "rm" => Command::Delete(parse_block(rest)?),
        "undo" => Command::Undo,
        "reset" => Command::Reset,
        "dump" => Command::Dump,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "" => Command::List,
        other => return Err(format!("unknown command `{other}` (try `help`)")),
    };
    Ok(command)
}

async fn execute<R: AsyncBufRead + Unpin>(
    editor: &mut Editor<MemorySurface>,
    command: Command,
    lines: &mut Lines<R>,
) -> Result<()> {
    match command {
        Command::List => print_blocks(editor),
        Command::Outline => {
            for section in editor.outline() {
                match section.head {
                    Some(head) => println!("{} {}", head.kind, head.plain_text()),
                    None => println!("(no heading)"),
                }
                for paragraph in section.paragraphs {
                    println!("    {}", paragraph.id);
                }
            }
        }
        Command::Text => println!("{}", editor.plain_text()),
        Command::Edit(id) => {
            editor.click(Some(&id))?;
            println!("editing {id}");
        }
        Command::Type(text) => {
            if !editor.surface_mut().type_text(&text) {
                bail!("nothing is being edited; use `edit <id>` first");
            }
        }
        Command::Set(id, html) => editor.set_content(&id, &html)?,
        Command::Done => editor.click(None)?,
        Command::Add(anchor) => {
            let id = editor.add_after(&anchor)?;
            println!("added {id}");
        }
        Command::Chapter(anchor) => {
            let (chapter, paragraph) = editor.add_chapter_after(&anchor)?;
            println!("added {chapter} with {paragraph}");
        }
        Command::Clone(source) => {
            let id = editor.clone_block(&source)?;
            println!("cloned into {id}");
        }
        Command::Delete(id) => {
            let mut answer = Answer(true);
            if let Some(prompt) = editor.needs_confirmation(&id) {
                println!("{prompt} [y/N]");
                let reply = lines.next_line().await?.unwrap_or_default();
                answer = Answer(matches!(reply.trim(), "y" | "Y" | "yes"));
            }
            match editor.delete(&id, &mut answer)? {
                DeleteOutcome::Deleted { label, .. } => {
                    let secs = editor.config().undo_window().as_secs();
                    println!("{label}. `undo` within {secs}s to restore.");
                }
                DeleteOutcome::Cancelled => println!("kept {id}"),
            }
        }
        Command::Undo => {
            if editor.undo() {
                println!("restored");
            } else {
                println!("nothing to undo");
            }
        }
        Command::Reset => {
            editor.reset();
            println!("{}", editor.plain_text());
        }
        Command::Dump => match editor.saved_json() {
            Some(json) => println!("{json}"),
            None => println!("(nothing saved yet)"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn print_blocks(editor: &Editor<MemorySurface>) {
    for block in editor.pool().visible_ordered() {
        let marker = if editor.active() == Some(&block.id) { "*" } else { " " };
        let text = editor
            .surface()
            .read(&block.id)
            .map(|html| strip_markup(&html))
            .unwrap_or_else(|| block.plain_text());
        println!("{marker} {:>11}  {}", block.id.to_string(), text);
    }
    println!("{}", slot_summary(editor.pool()));
}

/// Free slots per kind, e.g. `free: title 2/3, chapter 9/10, paragraph 48/50`.
fn slot_summary(pool: &BlockPool) -> String {
    let layout = pool.layout();
    let kinds: Vec<String> = BlockKind::ALL
        .iter()
        .map(|&kind| format!("{kind} {}/{}", pool.free_slots(kind), layout.capacity(kind)))
        .collect();
    format!("free: {}", kinds.join(", "))
}
