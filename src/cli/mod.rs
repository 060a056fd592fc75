use std::{
    ffi::OsString,
    io::{self, BufRead, Write as _},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Arg, Command, value_parser};
use clap_complete::{Shell, generate};

use crate::{
    board::{BoardData, MarkupType, NodeHandler},
    editor::{
        Adapter, EditCommand, Editor, EditorOptions, InteractionMode, NavPath, Navigator,
        run_editor,
    },
    sgf::{Color, GoCodec, XYMove, XYPoint},
};

const HELP: &str = "\
commands:
  next | n          step forward
  prev | p          step back
  play <point>      play a move, e.g. `play dd`
  pass              play a pass
  var <n>           follow variation n (0 = A)
  goto <path>       jump to a path such as 1.0:7
  vars              list the variations on offer
  path              print the current path
  tree              print the game tree
  show              print the board again
  quit | q          leave";

/// Columns and rows beyond this have no coordinate letter.
const MAX_AXIS: i64 = 52;

const EMPTY_BOARD: &str = "(;GM[1]FF[4]SZ[19])";

pub struct CliAdapter {
    board: String,
    tree: String,
    path: String,
    variations: Vec<Option<XYMove>>,
}

impl CliAdapter {
    fn new() -> Self {
        Self {
            board: String::new(),
            tree: String::new(),
            path: String::new(),
            variations: Vec::new(),
        }
    }

    fn print_variations(&self) {
        if self.variations.is_empty() {
            println!("no variations here");
        }
        for (i, mv) in self.variations.iter().enumerate() {
            let label = char::from_u32('A' as u32 + i as u32).unwrap_or('?');
            match mv {
                Some(mv) => println!("  {} ({}): {}", label, i, describe_move(mv)),
                None => println!("  {} ({}): no move", label, i),
            }
        }
    }
}

fn describe_move(mv: &XYMove) -> String {
    match mv.0 {
        Some(point) if point != XYMove::PASS_SENTINEL => point.to_string(),
        _ => "pass".to_string(),
    }
}

fn column_label(n: i64) -> char {
    XYPoint::new(n, 1).to_string().chars().next().unwrap_or('?')
}

/// The points to draw: the bounding box of the `VW` area if there is one,
/// the whole board otherwise.
fn visible_area(data: &BoardData<GoCodec>) -> (i64, i64, i64, i64) {
    let visible: Vec<XYPoint> = data
        .inherited
        .iter()
        .filter(|m| m.kind == MarkupType::Visible)
        .map(|m| m.point)
        .collect();
    if visible.is_empty() {
        return (1, 1, data.config.columns.min(MAX_AXIS), data.config.rows.min(MAX_AXIS));
    }
    let min_x = visible.iter().map(|p| p.x).min().unwrap_or(1);
    let min_y = visible.iter().map(|p| p.y).min().unwrap_or(1);
    let max_x = visible.iter().map(|p| p.x).max().unwrap_or(data.config.columns);
    let max_y = visible.iter().map(|p| p.y).max().unwrap_or(data.config.rows);
    (min_x, min_y, max_x, max_y)
}

fn cell(data: &BoardData<GoCodec>, point: XYPoint) -> char {
    if let Some(piece) = data.pieces.iter().find(|p| p.stone == point) {
        return match piece.color {
            Color::Black => 'X',
            Color::White => 'O',
        };
    }
    if let Some(marker) = data.variations.iter().find(|m| m.point == point) {
        return marker
            .label
            .as_deref()
            .and_then(|l| l.chars().next())
            .map_or('?', |c| c.to_ascii_lowercase());
    }
    let markup = data.markup.iter().chain(&data.inherited).find(|m| m.point == point);
    match markup.map(|m| m.kind) {
        Some(MarkupType::Label) => markup
            .and_then(|m| m.label.as_deref())
            .and_then(|l| l.chars().next())
            .unwrap_or('*'),
        Some(MarkupType::Dim) => ',',
        Some(MarkupType::Visible) | None => '.',
        Some(_) => '*',
    }
}

fn render_board(data: &BoardData<GoCodec>) -> String {
    let (min_x, min_y, max_x, max_y) = visible_area(data);
    let mut out = String::from("   ");
    for x in min_x..=max_x {
        out.push(column_label(x));
        out.push(' ');
    }
    out.push('\n');
    for y in min_y..=max_y {
        out.push_str(&format!(" {} ", column_label(y)));
        for x in min_x..=max_x {
            out.push(cell(data, XYPoint::new(x, y)));
            out.push(' ');
        }
        out.push('\n');
    }

    if let Some(last) = &data.last_move {
        out.push_str(&format!(
            "move {}: {} {}   captures: black {}, white {}\n",
            last.move_number,
            last.color,
            describe_move(&last.played),
            last.prisoners.by_black,
            last.prisoners.by_white,
        ));
    }
    for info in &data.node_info {
        out.push_str(&format!("{}\n", info));
    }
    out
}

fn render_tree(navigator: &Navigator<GoCodec>) -> String {
    let tree = navigator.tree();
    let Some(&root) = tree.roots.first() else {
        return String::new();
    };
    let current = navigator.position().map(|(id, _)| id);

    let mut out = String::new();
    for (id, subtree) in tree.iter_subtree(root) {
        let indent = "  ".repeat(tree.path_to(id).len());
        let marker = if Some(id) == current { "* " } else { "  " };
        let moves: Vec<String> = subtree
            .sequence
            .iter()
            .filter_map(|n| n.find_move())
            .map(describe_move)
            .collect();
        out.push_str(&format!(
            "{}{}{} node(s) {}\n",
            indent,
            marker,
            subtree.sequence.len(),
            moves.join(" ")
        ));
    }
    out
}

impl Adapter<GoCodec> for CliAdapter {
    fn render(&mut self, editor: &Editor<GoCodec>) -> Result<()> {
        self.board = render_board(&editor.data());
        self.tree = render_tree(editor.navigator());
        self.path = editor.path().to_string();
        self.variations = editor.variations();
        print!("{}", self.board);
        Ok(())
    }

    fn next_command(&mut self) -> Result<Option<EditCommand<GoCodec>>> {
        let stdin = io::stdin();
        loop {
            print!("> ");
            io::stdout().flush()?;

            let mut line = String::new();
            let n = stdin.lock().read_line(&mut line)?;
            if n == 0 {
                return Ok(None); // EOF
            }

            let line = line.trim();
            let (cmd, rest) = match line.split_once(' ') {
                Some((c, r)) => (c, r.trim()),
                None => (line, ""),
            };

            match cmd {
                "quit" | "q" => return Ok(None),
                "next" | "n" => return Ok(Some(EditCommand::Advance)),
                "prev" | "p" => return Ok(Some(EditCommand::Retreat)),
                "pass" => {
                    return Ok(Some(EditCommand::Play { mv: XYMove::pass(), variation: None }));
                }
                "play" => match rest.parse::<XYPoint>() {
                    Ok(point) => {
                        let mv = XYMove(Some(point));
                        return Ok(Some(EditCommand::Play { mv, variation: None }));
                    }
                    Err(e) => eprintln!("{:#}", e),
                },
                "var" => match rest.parse::<usize>() {
                    Ok(n) if n < self.variations.len() => {
                        let mv = self.variations[n].unwrap_or_default();
                        return Ok(Some(EditCommand::Play { mv, variation: Some(n) }));
                    }
                    _ => eprintln!("no variation {:?}", rest),
                },
                "goto" => match rest.parse::<NavPath>() {
                    Ok(path) => return Ok(Some(EditCommand::GoTo(path))),
                    Err(e) => eprintln!("{:#}", e),
                },
                "vars" => self.print_variations(),
                "path" => println!("{}", self.path),
                "tree" => print!("{}", self.tree),
                "show" => print!("{}", self.board),
                "help" => println!("{}", HELP),
                "" => {}
                _ => eprintln!("unknown command: {} (try `help`)", line),
            }
        }
    }
}

fn command() -> Command {
    Command::new("joseki")
        .about("Step through SGF game records")
        .arg(
            Arg::new("file")
                .help("SGF file to open; an empty 19x19 board without one")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("path")
                .long("path")
                .value_name("PATH")
                .help("Start at this position, e.g. 1.0:7"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser(["free", "countermove", "disable"])
                .default_value("free")
                .help("What playing a move does"),
        )
        .arg(
            Arg::new("variations")
                .long("variations")
                .value_parser(["sgf", "show", "hide"])
                .default_value("sgf")
                .help("Variation markers: as the file says, always or never"),
        )
        .subcommand(
            Command::new("completions")
                .about("Print a shell completion script")
                .arg(Arg::new("shell").required(true).value_parser(value_parser!(Shell))),
        )
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().get_matches_from(args);

    if let Some(sub) = matches.subcommand_matches("completions") {
        let shell = *sub.get_one::<Shell>("shell").context("no shell given")?;
        generate(shell, &mut command(), "joseki", &mut io::stdout());
        return Ok(());
    }

    let source = match matches.get_one::<PathBuf>("file") {
        Some(file) => std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        None => EMPTY_BOARD.to_string(),
    };

    let path = match matches.get_one::<String>("path") {
        Some(path) => path.parse()?,
        None => NavPath::default(),
    };
    let interaction_mode = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("countermove") => InteractionMode::Countermove,
        Some("disable") => InteractionMode::Disable,
        _ => InteractionMode::FreePlay,
    };
    let show_variations = match matches.get_one::<String>("variations").map(String::as_str) {
        Some("show") => Some(true),
        Some("hide") => Some(false),
        _ => None,
    };

    let options = EditorOptions { show_variations, interaction_mode };
    let editor = Editor::load_at(source, GoCodec, NodeHandler::default(), options, &path);
    let mut adapter = CliAdapter::new();
    run_editor(editor, &mut adapter)
}
