use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::collections::HashSet;
use crate::common::config::{Config, LayoutSettings};
use crate::layout_engine::frame::FrameError;
use crate::layout_engine::frame_tree::{MirrorAxis, SplitMode};
use crate::layout_engine::navigation::NavigationError;
use crate::layout_engine::serialize::LoadError;
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::tiling::TilingResult;
use crate::layout_engine::{Direction, Fraction, LayoutAlgorithm, NavigationScope};
use crate::model::{ClientFlags, ClientId, ClientRegistry, ClientTable, TagError, TagSet};

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutCommand {
    Split { mode: SplitMode, fraction: Option<Fraction> },
    Remove,
    Focus { direction: Direction, scope: NavigationScope },
    Shift { direction: Direction, scope: NavigationScope },
    Cycle { delta: isize },
    CycleAll { delta: isize, skip_invisible: bool },
    CycleFrame { delta: isize },
    CycleLayout { delta: isize, names: Vec<LayoutAlgorithm> },
    SetLayout(LayoutAlgorithm),
    Rotate,
    Mirror(MirrorAxis),
    Resize { direction: Direction, delta: Option<Fraction> },
    Dump { tag: Option<String> },
    Load { tag: Option<String>, description: String },
    Layout { tag: Option<String> },
    Add(String),
    Use(String),
    Move(String),
    /// Removes `tag`, moving its clients into `target`.
    MergeTag { tag: String, target: String },
    Manage { client: ClientId, flags: ClientFlags },
    Unmanage(ClientId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),
    #[error("invalid argument \"{token}\": {reason}")]
    InvalidArgument { token: String, reason: String },
    #[error("{0}: not enough arguments")]
    NeedMoreArgs(String),
    #[error("{0}")]
    Forbidden(String),
}

impl CommandError {
    /// Numeric result code, as reported by the command surface.
    pub fn code(&self) -> i32 {
        match self {
            CommandError::UnknownCommand(_) => 1,
            CommandError::InvalidArgument { .. } => 2,
            CommandError::NeedMoreArgs(_) => 3,
            CommandError::Forbidden(_) => 4,
        }
    }

    fn invalid(token: &str, reason: impl ToString) -> Self {
        CommandError::InvalidArgument {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<FrameError> for CommandError {
    fn from(err: FrameError) -> Self { CommandError::Forbidden(err.to_string()) }
}

impl From<NavigationError> for CommandError {
    fn from(err: NavigationError) -> Self { CommandError::Forbidden(err.to_string()) }
}

impl From<TagError> for CommandError {
    fn from(err: TagError) -> Self {
        match &err {
            TagError::UnknownTag(name) | TagError::InvalidName(name) | TagError::DuplicateTag(name) => {
                CommandError::invalid(name, &err)
            }
            _ => CommandError::Forbidden(err.to_string()),
        }
    }
}

impl From<LoadError> for CommandError {
    fn from(err: LoadError) -> Self {
        let token = err.remainder.split_whitespace().next().unwrap_or_default().to_string();
        CommandError::InvalidArgument { token, reason: err.to_string() }
    }
}

fn parse_token<T: std::str::FromStr>(token: &str, what: &str) -> Result<T, CommandError> {
    token.parse().map_err(|_| CommandError::invalid(token, format!("expected {what}")))
}

fn required<'a>(args: &[&'a str], index: usize, command: &str) -> Result<&'a str, CommandError> {
    args.get(index).copied().ok_or_else(|| CommandError::NeedMoreArgs(command.to_string()))
}

fn delta_arg(args: &[&str], index: usize) -> Result<isize, CommandError> {
    args.get(index).map_or(Ok(1), |token| parse_token(token, "an integer delta"))
}

/// Leading `-i`/`-e` flags of focus and shift, and the remaining arguments.
fn scoped<'a, 'b>(args: &'b [&'a str]) -> (NavigationScope, &'b [&'a str]) {
    let mut scope = NavigationScope::Auto;
    let mut rest = args;
    while let Some((first, tail)) = rest.split_first() {
        match NavigationScope::from_flag(first) {
            Some(flag) => {
                scope = flag;
                rest = tail;
            }
            None => break,
        }
    }
    (scope, rest)
}

impl LayoutCommand {
    pub fn parse<S: AsRef<str>>(argv: &[S]) -> Result<Self, CommandError> {
        let Some((name, args)) = argv.split_first() else {
            return Err(CommandError::NeedMoreArgs("command".to_string()));
        };
        let name = name.as_ref();
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let args = args.as_slice();

        let command = match name {
            "split" => LayoutCommand::Split {
                mode: parse_token(required(args, 0, name)?, "a split mode")?,
                fraction: args.get(1).map(|t| parse_token(t, "a fraction")).transpose()?,
            },
            "remove" => LayoutCommand::Remove,
            "focus" | "shift" => {
                let (scope, rest) = scoped(args);
                let direction = parse_token(required(rest, 0, name)?, "a direction")?;
                if name == "focus" {
                    LayoutCommand::Focus { direction, scope }
                } else {
                    LayoutCommand::Shift { direction, scope }
                }
            }
            "cycle" => LayoutCommand::Cycle { delta: delta_arg(args, 0)? },
            "cycle_all" => {
                let skip_invisible = args.first() == Some(&"--skip-invisible");
                let rest = if skip_invisible { &args[1..] } else { args };
                LayoutCommand::CycleAll {
                    delta: delta_arg(rest, 0)?,
                    skip_invisible,
                }
            }
            "cycle_frame" => LayoutCommand::CycleFrame { delta: delta_arg(args, 0)? },
            "cycle_layout" => LayoutCommand::CycleLayout {
                delta: delta_arg(args, 0)?,
                names: args
                    .iter()
                    .skip(1)
                    .map(|t| parse_token(t, "a layout name"))
                    .collect::<Result<_, _>>()?,
            },
            "set_layout" => {
                LayoutCommand::SetLayout(parse_token(required(args, 0, name)?, "a layout name")?)
            }
            "rotate" => LayoutCommand::Rotate,
            "mirror" => LayoutCommand::Mirror(
                args.first().map(|t| parse_token(t, "horizontal, vertical or both")).transpose()?.unwrap_or_default(),
            ),
            "resize" => LayoutCommand::Resize {
                direction: parse_token(required(args, 0, name)?, "a direction")?,
                delta: args.get(1).map(|t| parse_token(t, "a fraction")).transpose()?,
            },
            "dump" => LayoutCommand::Dump { tag: args.first().map(|t| t.to_string()) },
            "layout" => LayoutCommand::Layout { tag: args.first().map(|t| t.to_string()) },
            "load" => {
                let first = required(args, 0, name)?;
                let (tag, description) = if first.starts_with('(') {
                    (None, args)
                } else if args.len() > 1 {
                    (Some(first.to_string()), &args[1..])
                } else {
                    return Err(CommandError::NeedMoreArgs(name.to_string()));
                };
                LayoutCommand::Load { tag, description: description.join(" ") }
            }
            "add" => LayoutCommand::Add(required(args, 0, name)?.to_string()),
            "use" => LayoutCommand::Use(required(args, 0, name)?.to_string()),
            "move" => LayoutCommand::Move(required(args, 0, name)?.to_string()),
            "merge_tag" => LayoutCommand::MergeTag {
                tag: required(args, 0, name)?.to_string(),
                target: required(args, 1, name)?.to_string(),
            },
            "manage" => {
                let client = parse_token(required(args, 0, name)?, "a window id")?;
                let mut flags = ClientFlags::empty();
                for &flag in &args[1..] {
                    match flag {
                        "--pseudotile" => flags |= ClientFlags::PSEUDOTILE,
                        "--fullscreen" => flags |= ClientFlags::FULLSCREEN,
                        other => return Err(CommandError::invalid(other, "unknown flag")),
                    }
                }
                LayoutCommand::Manage { client, flags }
            }
            "unmanage" => LayoutCommand::Unmanage(parse_token(required(args, 0, name)?, "a window id")?),
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// All tags, the client registry, and the settings they are laid out with.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LayoutEngine {
    tags: TagSet,
    clients: ClientTable,
    #[serde(skip)]
    settings: LayoutSettings,
    /// Monitor rectangle; when set, splits see up-to-date frame sizes.
    #[serde(skip)]
    screen: Option<Rect>,
}

impl LayoutEngine {
    pub fn new(config: &Config) -> Result<Self, TagError> {
        Ok(Self {
            tags: TagSet::new(&config.tags.names, config.settings.default_frame_layout)?,
            clients: ClientTable::new(),
            settings: config.settings.clone(),
            screen: None,
        })
    }

    pub fn set_screen(&mut self, rect: Rect) {
        self.screen = Some(rect);
    }

    pub fn settings(&self) -> &LayoutSettings { &self.settings }

    pub fn set_settings(&mut self, settings: LayoutSettings) { self.settings = settings; }

    pub fn tags(&self) -> &TagSet { &self.tags }

    pub fn clients(&self) -> &ClientTable { &self.clients }

    /// Layout of the focused tag.
    pub fn compute_layout(&self, rect: Rect) -> TilingResult {
        self.tags.focused().tree.compute_layout(rect, &self.settings, &self.clients)
    }

    pub fn run<S: AsRef<str>>(&mut self, argv: &[S]) -> Result<String, CommandError> {
        let command = LayoutCommand::parse(argv)?;
        self.execute(command)
    }

    /// Applies `command` to the focused tag (or the tag it names) and
    /// returns its textual output, which is empty for most commands.
    pub fn execute(&mut self, command: LayoutCommand) -> Result<String, CommandError> {
        debug!(?command, "executing");
        let Self { tags, clients, settings, screen } = self;
        let tree = &mut tags.focused_mut().tree;

        match command {
            LayoutCommand::Split { mode, fraction } => {
                if let Some(rect) = *screen {
                    // Refreshes the cached frame rectangles `auto` and `explode` read.
                    tree.compute_layout(rect, settings, &*clients);
                }
                let leaf = tree.focused_leaf();
                let fraction = fraction.unwrap_or_else(|| settings.split_fraction());
                tree.split_mode(leaf, mode, fraction, settings.max_alignment_depth)?;
            }
            LayoutCommand::Remove => {
                let leaf = tree.focused_leaf();
                tree.remove(leaf)?;
            }
            LayoutCommand::Focus { direction, scope } => tree.focus(direction, scope, settings)?,
            LayoutCommand::Shift { direction, scope } => tree.shift(direction, scope, settings)?,
            LayoutCommand::Cycle { delta } => tree.cycle(delta),
            LayoutCommand::CycleAll { delta, skip_invisible } => {
                tree.cycle_all(delta, skip_invisible, &*clients)?;
            }
            LayoutCommand::CycleFrame { delta } => {
                tree.cycle_frame(delta);
            }
            LayoutCommand::CycleLayout { delta, names } => {
                tree.cycle_layout(delta, &names)?;
            }
            LayoutCommand::SetLayout(layout) => {
                let leaf = tree.focused_leaf();
                tree.set_layout(leaf, layout)?;
            }
            LayoutCommand::Rotate => {
                let root = tree.root();
                tree.rotate(root);
            }
            LayoutCommand::Mirror(axis) => {
                let root = tree.root();
                tree.mirror(root, axis);
            }
            LayoutCommand::Resize { direction, delta } => {
                tree.resize(direction, delta.unwrap_or_else(|| settings.resize_fraction()))?;
            }
            LayoutCommand::Dump { tag } => {
                let tree = &tags.get(tag.as_deref())?.tree;
                return Ok(tree.dump(tree.root()));
            }
            LayoutCommand::Layout { tag } => return Ok(tags.get(tag.as_deref())?.tree.draw_tree()),
            LayoutCommand::Load { tag, description } => {
                let name = tags.get(tag.as_deref())?.name.clone();
                let foreign: HashSet<ClientId> = tags
                    .iter()
                    .filter(|t| t.name != name)
                    .flat_map(|t| t.tree.clients())
                    .collect();
                let known = |client: ClientId| clients.contains(client) && !foreign.contains(&client);
                let tree = &mut tags.get_mut(Some(&name))?.tree;
                let root = tree.root();
                let rest = tree.load(root, &description, &known, settings.max_alignment_depth)?;
                return Ok(rest.to_string());
            }
            LayoutCommand::Add(name) => {
                tags.add(&name, settings.default_frame_layout)?;
            }
            LayoutCommand::Use(name) => tags.focus(&name)?,
            LayoutCommand::Move(name) => {
                let client = tree
                    .focused_client()
                    .ok_or_else(|| CommandError::Forbidden("no client focused".to_string()))?;
                tags.move_client(client, &name)?;
            }
            LayoutCommand::MergeTag { tag, target } => tags.remove(&tag, &target)?,
            LayoutCommand::Manage { client, flags } => {
                if tags.tag_of(client).is_some() {
                    return Err(TagError::AlreadyManaged(client).into());
                }
                clients.insert(client, flags);
                tags.manage(client, None)?;
            }
            LayoutCommand::Unmanage(client) => {
                tags.unmanage(client)?;
                clients.remove(client);
            }
        }
        Ok(String::new())
    }

    pub fn restore_state(path: &Path, settings: LayoutSettings) -> anyhow::Result<Self> {
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let mut engine: LayoutEngine = ron::from_str(&buf)?;
        engine.settings = settings;
        Ok(engine)
    }

    pub fn save_state(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = ron::ser::to_string(&self)?;
        File::create(path)?.write_all(serialized.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::systems::MaxLayout;

    fn engine() -> LayoutEngine { LayoutEngine::new(&Config::default()).unwrap() }

    fn run(engine: &mut LayoutEngine, line: &str) -> Result<String, CommandError> {
        engine.run(&line.split_whitespace().collect::<Vec<_>>())
    }

    #[test]
    fn parses_commands() {
        let parse = |line: &str| LayoutCommand::parse(&line.split_whitespace().collect::<Vec<_>>());
        assert_eq!(
            parse("focus -i left"),
            Ok(LayoutCommand::Focus {
                direction: Direction::Left,
                scope: NavigationScope::InternalOnly
            })
        );
        assert_eq!(
            parse("split explode 0.3"),
            Ok(LayoutCommand::Split {
                mode: SplitMode::Explode,
                fraction: Some(Fraction::from_units(3_000))
            })
        );
        assert_eq!(parse("cycle_all --skip-invisible -1"), Ok(LayoutCommand::CycleAll { delta: -1, skip_invisible: true }));
        assert_eq!(parse("cycle"), Ok(LayoutCommand::Cycle { delta: 1 }));
        assert_eq!(
            parse("cycle_layout +1 max grid"),
            Ok(LayoutCommand::CycleLayout {
                delta: 1,
                names: vec![LayoutAlgorithm::Max(MaxLayout), "grid".parse().unwrap()]
            })
        );
        assert_eq!(parse("mirror"), Ok(LayoutCommand::Mirror(MirrorAxis::Both)));
        assert_eq!(
            parse("load 2 (clients max:0 0x1)"),
            Ok(LayoutCommand::Load {
                tag: Some("2".into()),
                description: "(clients max:0 0x1)".into()
            })
        );
        assert_eq!(
            parse("manage 0x10 --pseudotile"),
            Ok(LayoutCommand::Manage { client: ClientId(16), flags: ClientFlags::PSEUDOTILE })
        );
    }

    #[test]
    fn parse_errors_carry_codes() {
        let parse = |line: &str| LayoutCommand::parse(&line.split_whitespace().collect::<Vec<_>>());
        let err = parse("frobnicate").unwrap_err();
        assert_eq!(err.code(), 1);

        let err = parse("focus sideways").unwrap_err();
        assert_eq!(err.code(), 2);
        assert!(err.to_string().contains("sideways"));

        assert_eq!(parse("split").unwrap_err().code(), 3);
        assert_eq!(parse("focus -e").unwrap_err().code(), 3);
        assert_eq!(parse("load tag").unwrap_err().code(), 3);
        assert_eq!(parse("resize left lots").unwrap_err().code(), 2);
        assert_eq!(parse("manage 0x1 --floating").unwrap_err().code(), 2);
        assert_eq!(LayoutCommand::parse::<&str>(&[]).unwrap_err().code(), 3);
    }

    #[test]
    fn structural_errors_are_forbidden() {
        let mut engine = engine();
        assert_eq!(run(&mut engine, "remove").unwrap_err().code(), 4);
        assert_eq!(run(&mut engine, "focus left").unwrap_err().code(), 4);
        assert_eq!(run(&mut engine, "shift left").unwrap_err().code(), 4);
        assert_eq!(run(&mut engine, "resize left").unwrap_err().code(), 4);
        assert_eq!(run(&mut engine, "use 9").unwrap_err().code(), 2);
    }

    #[test]
    fn drives_a_session() {
        let mut engine = engine();
        for line in ["manage 0x1", "manage 0x2", "manage 0x3", "manage 0x4"] {
            run(&mut engine, line).unwrap();
        }
        run(&mut engine, "split explode").unwrap();
        assert_eq!(
            run(&mut engine, "dump").unwrap(),
            "(split vertical:0.5:1 (clients vertical:1 0x1 0x2) (clients vertical:1 0x3 0x4))"
        );

        run(&mut engine, "focus -e up").unwrap();
        run(&mut engine, "set_layout max").unwrap();
        run(&mut engine, "resize down 0.1").unwrap();
        assert_eq!(
            run(&mut engine, "dump").unwrap(),
            "(split vertical:0.6:0 (clients max:1 0x1 0x2) (clients vertical:1 0x3 0x4))"
        );

        let layout = engine.compute_layout(Rect::new(0, 0, 100, 100));
        assert_eq!(layout.focus, Some(ClientId(2)));
        assert_eq!(layout.visible_clients().collect::<Vec<_>>(), vec![ClientId(2), ClientId(3), ClientId(4)]);

        run(&mut engine, "move 2").unwrap();
        assert_eq!(engine.tags().tag_of(ClientId(2)), Some("2"));
        run(&mut engine, "unmanage 0x3").unwrap();
        assert_eq!(engine.tags().focused().tree.clients(), vec![ClientId(1), ClientId(4)]);
        assert!(!engine.clients().contains(ClientId(3)));
        assert!(run(&mut engine, "layout").unwrap().contains("max: [0x1]"));
    }

    #[test]
    fn load_only_places_known_clients() {
        let mut engine = engine();
        run(&mut engine, "manage 0x1").unwrap();
        run(&mut engine, "use 2").unwrap();
        run(&mut engine, "manage 0x2").unwrap();
        run(&mut engine, "use 1").unwrap();

        let rest = run(&mut engine, "load (clients grid:0 0x2 0x1 0x7) tail").unwrap();
        assert_eq!(rest, "tail");
        assert_eq!(run(&mut engine, "dump").unwrap(), "(clients grid:0 0x1)");
        assert_eq!(run(&mut engine, "dump 2").unwrap(), "(clients vertical:0 0x2)");

        let err = run(&mut engine, "load (clients spiral:0)").unwrap_err();
        assert_eq!(err.code(), 2);
        assert_eq!(err, CommandError::InvalidArgument {
            token: "spiral:0)".into(),
            reason: "unknown layout \"spiral\" at offset 9, near \"spiral:0)\"".into(),
        });
    }

    #[test]
    fn tags_can_be_added_and_used() {
        let mut engine = engine();
        run(&mut engine, "add web").unwrap();
        assert_eq!(run(&mut engine, "add web").unwrap_err().code(), 2);
        run(&mut engine, "use web").unwrap();
        run(&mut engine, "manage 0x5 --fullscreen").unwrap();
        assert_eq!(engine.tags().tag_of(ClientId(5)), Some("web"));
        assert_eq!(run(&mut engine, "manage 0x5").unwrap_err().code(), 4);
        let layout = engine.compute_layout(Rect::new(0, 0, 10, 10));
        assert!(layout.steps[0].fullscreen);
    }

    #[test]
    fn merging_tags_keeps_their_clients() {
        let mut engine = engine();
        run(&mut engine, "manage 0x1").unwrap();
        run(&mut engine, "use 2").unwrap();
        run(&mut engine, "manage 0x2").unwrap();

        assert_eq!(run(&mut engine, "merge_tag 2").unwrap_err().code(), 3);
        assert_eq!(run(&mut engine, "merge_tag 2 9").unwrap_err().code(), 2);
        assert_eq!(run(&mut engine, "merge_tag 2 2").unwrap_err().code(), 4);

        run(&mut engine, "merge_tag 2 1").unwrap();
        assert_eq!(engine.tags().names().collect::<Vec<_>>(), vec!["1", "3", "4"]);
        assert_eq!(engine.tags().focused().name, "1");
        assert_eq!(run(&mut engine, "dump").unwrap(), "(clients vertical:1 0x1 0x2)");
    }

    #[test]
    fn huge_deltas_do_not_overflow() {
        let mut engine = engine();
        run(&mut engine, "manage 0x1").unwrap();
        run(&mut engine, "manage 0x2").unwrap();

        run(&mut engine, "cycle 9223372036854775807").unwrap();
        assert_eq!(engine.tags().focused().tree.focused_client(), Some(ClientId(1)));
        run(&mut engine, "cycle -9223372036854775808").unwrap();
        assert_eq!(engine.tags().focused().tree.focused_client(), Some(ClientId(1)));

        run(&mut engine, "cycle_layout 9223372036854775807").unwrap();
        assert_eq!(run(&mut engine, "dump").unwrap(), "(clients grid:0 0x1 0x2)");
        run(&mut engine, "cycle_layout -9223372036854775808").unwrap();
        assert_eq!(run(&mut engine, "dump").unwrap(), "(clients grid:0 0x1 0x2)");

        run(&mut engine, "split right").unwrap();
        run(&mut engine, "cycle_frame 9223372036854775807").unwrap();
        run(&mut engine, "cycle_frame -9223372036854775808").unwrap();
        assert_eq!(engine.tags().focused().tree.focused_client(), None);
        run(&mut engine, "cycle_all 9223372036854775807").unwrap();
        assert_eq!(engine.tags().focused().tree.focused_client(), Some(ClientId(1)));
    }

    #[test]
    fn auto_splits_follow_the_screen_shape() {
        let mut engine = engine();
        engine.set_screen(Rect::new(0, 0, 1920, 1080));
        run(&mut engine, "manage 0x1").unwrap();
        run(&mut engine, "manage 0x2").unwrap();

        run(&mut engine, "split auto").unwrap();
        assert_eq!(
            run(&mut engine, "dump").unwrap(),
            "(split horizontal:0.5:0 (clients vertical:1 0x1 0x2) (clients vertical:0))"
        );
        // the left half is taller than wide
        run(&mut engine, "split explode").unwrap();
        assert_eq!(
            run(&mut engine, "dump").unwrap(),
            "(split horizontal:0.5:0 (split vertical:0.5:1 (clients vertical:0 0x1) (clients vertical:0 0x2)) (clients vertical:0))"
        );
    }

    #[test]
    fn state_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("layout.ron");
        let mut engine = engine();
        for line in ["manage 0x1 --pseudotile", "manage 0x2", "split right", "use 3", "manage 0x3"] {
            run(&mut engine, line).unwrap();
        }
        engine.save_state(&path).unwrap();

        let mut restored = LayoutEngine::restore_state(&path, LayoutSettings::default()).unwrap();
        assert_eq!(restored.tags().focused().name, "3");
        assert_eq!(run(&mut restored, "dump 1").unwrap(), run(&mut engine, "dump 1").unwrap());
        assert!(restored.clients().contains(ClientId(1)));
        run(&mut restored, "use 1").unwrap();
        run(&mut restored, "focus right").unwrap();
    }
}
