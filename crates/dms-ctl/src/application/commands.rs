//! Subcommands and their mapping onto protocol requests.
//!
//! Every subcommand except `watch` sends exactly one [`Request`] and prints
//! the matching [`Response`] as JSON.  Failures reported by the service
//! become a [`CommandError`] so `main` can exit non-zero.

use clap::{Subcommand, ValueEnum};
use serde_json::{json, Value};
use thiserror::Error;

use dms_core::{
    DisplayId, DmError, FoldDisplayMode, ListenerKind, Orientation, Point, Request, Response,
    ScreenId, SnapshotError, VirtualScreenOption,
};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("service error {code}: {message}")]
    Service { code: i32, message: String },

    #[error("snapshot failed: {0}")]
    Snapshot(SnapshotError),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<DmError> for CommandError {
    fn from(e: DmError) -> Self {
        CommandError::Service {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

// ── Argument enums ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FoldModeArg {
    Full,
    Main,
    Sub,
    Coordination,
}

impl From<FoldModeArg> for FoldDisplayMode {
    fn from(arg: FoldModeArg) -> Self {
        match arg {
            FoldModeArg::Full => FoldDisplayMode::Full,
            FoldModeArg::Main => FoldDisplayMode::Main,
            FoldModeArg::Sub => FoldDisplayMode::Sub,
            FoldModeArg::Coordination => FoldDisplayMode::Coordination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrientationArg {
    Unspecified,
    Vertical,
    Horizontal,
    ReverseVertical,
    ReverseHorizontal,
    Sensor,
    Locked,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Unspecified => Orientation::Unspecified,
            OrientationArg::Vertical => Orientation::Vertical,
            OrientationArg::Horizontal => Orientation::Horizontal,
            OrientationArg::ReverseVertical => Orientation::ReverseVertical,
            OrientationArg::ReverseHorizontal => Orientation::ReverseHorizontal,
            OrientationArg::Sensor => Orientation::Sensor,
            OrientationArg::Locked => Orientation::Locked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Screen,
    Display,
    FoldDisplayMode,
    FoldStatus,
}

impl From<KindArg> for ListenerKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Screen => ListenerKind::Screen,
            KindArg::Display => ListenerKind::Display,
            KindArg::FoldDisplayMode => ListenerKind::FoldDisplayMode,
            KindArg::FoldStatus => ListenerKind::FoldStatus,
        }
    }
}

/// Parses `x,y` into a [`Point`].  Negative coordinates are allowed.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x = x.trim().parse().map_err(|_| format!("invalid x in {s:?}"))?;
    let y = y.trim().parse().map_err(|_| format!("invalid y in {s:?}"))?;
    Ok(Point::new(x, y))
}

// ── Subcommands ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Lists every screen with its modes and group.
    Screens,
    /// Shows one screen.
    Screen { id: u64 },
    /// Lists display ids.
    Displays,
    /// Shows one display.
    Display { id: u64 },
    /// Prints the default display id.
    DefaultDisplay,
    /// Shows a screen group (use a screen's `parent` id).
    Group { id: u64 },
    /// Mirrors `main` onto each target screen.
    Mirror {
        main: u64,
        #[arg(required = true)]
        targets: Vec<u64>,
    },
    /// Extends the desktop: one `--screen` per `--at x,y`, in order.
    Expand {
        #[arg(long = "screen", required = true)]
        screens: Vec<u64>,
        #[arg(long = "at", value_parser = parse_point, allow_hyphen_values = true, required = true)]
        points: Vec<Point>,
    },
    StopMirror {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    StopExpand {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Selects the active mode by index into the screen's mode list.
    SetMode { id: u64, index: u32 },
    Orientation {
        id: u64,
        #[arg(value_enum)]
        orientation: OrientationArg,
    },
    /// Creates a virtual screen and prints its id.
    CreateVirtual {
        name: String,
        width: u32,
        height: u32,
        #[arg(long, default_value_t = 1.0)]
        density: f32,
    },
    DestroyVirtual { id: u64 },
    Foldable,
    FoldStatus,
    /// Prints the current fold display mode.
    FoldMode,
    SetFoldMode {
        #[arg(value_enum)]
        mode: FoldModeArg,
    },
    /// Locks or unlocks the fold display mode against sensor changes.
    LockFold {
        #[arg(action = clap::ArgAction::Set)]
        locked: bool,
    },
    /// Prints the crease region of the default display.
    Crease,
    /// Streams change events as JSON lines until interrupted.
    Watch {
        #[arg(long = "kind", value_enum)]
        kinds: Vec<KindArg>,
    },
}

impl Command {
    /// The request this command sends, or `None` for `watch`, which
    /// subscribes instead.
    pub fn to_request(&self) -> Option<Request> {
        let request = match self {
            Command::Screens => Request::GetAllScreenInfos,
            Command::Screen { id } => Request::GetScreenInfoById(ScreenId(*id)),
            Command::Displays => Request::GetAllDisplayIds,
            Command::Display { id } => Request::GetDisplayById(DisplayId(*id)),
            Command::DefaultDisplay => Request::GetDefaultDisplayId,
            Command::Group { id } => Request::GetScreenGroupInfoById(ScreenId(*id)),
            Command::Mirror { main, targets } => Request::MakeMirror {
                main: ScreenId(*main),
                targets: screen_ids(targets),
            },
            Command::Expand { screens, points } => Request::MakeExpand {
                ids: screen_ids(screens),
                points: points.clone(),
            },
            Command::StopMirror { ids } => Request::StopMirror(screen_ids(ids)),
            Command::StopExpand { ids } => Request::StopExpand(screen_ids(ids)),
            Command::SetMode { id, index } => Request::SetScreenActiveMode {
                id: ScreenId(*id),
                mode_index: *index,
            },
            Command::Orientation { id, orientation } => Request::SetOrientation {
                id: ScreenId(*id),
                orientation: (*orientation).into(),
            },
            Command::CreateVirtual {
                name,
                width,
                height,
                density,
            } => {
                let mut option = VirtualScreenOption::new(name.clone(), *width, *height);
                option.density = *density;
                Request::CreateVirtualScreen(option)
            }
            Command::DestroyVirtual { id } => Request::DestroyVirtualScreen(ScreenId(*id)),
            Command::Foldable => Request::IsFoldable,
            Command::FoldStatus => Request::GetFoldStatus,
            Command::FoldMode => Request::GetFoldDisplayMode,
            Command::SetFoldMode { mode } => Request::SetFoldDisplayMode((*mode).into()),
            Command::LockFold { locked } => Request::LockFoldDisplayStatus(*locked),
            Command::Crease => Request::GetCurrentFoldCreaseRegion,
            Command::Watch { .. } => return None,
        };
        Some(request)
    }

    /// Listener kinds for `watch`; all kinds when none were given.
    pub fn watch_kinds(&self) -> Vec<ListenerKind> {
        match self {
            Command::Watch { kinds } if kinds.is_empty() => vec![
                ListenerKind::Screen,
                ListenerKind::Display,
                ListenerKind::FoldDisplayMode,
                ListenerKind::FoldStatus,
            ],
            Command::Watch { kinds } => kinds.iter().map(|k| (*k).into()).collect(),
            _ => Vec::new(),
        }
    }
}

fn screen_ids(ids: &[u64]) -> Vec<ScreenId> {
    ids.iter().copied().map(ScreenId).collect()
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Turns a response into the JSON printed on stdout.  Error results from
/// the service become `Err`.  Missing entities print as `null`.
pub fn render(response: Response) -> Result<Value, CommandError> {
    let value = match response {
        Response::Status(result) => {
            result?;
            json!({ "ok": true })
        }
        Response::CreatedScreen(result) => json!({ "screen_id": result? }),
        Response::DefaultDisplayId(id) => json!({ "display_id": id }),
        Response::Display(info) => serde_json::to_value(info)?,
        Response::DisplayIds(ids) => serde_json::to_value(ids)?,
        Response::Snapshot(result) => {
            let buffer = result.map_err(CommandError::Snapshot)?;
            json!({ "width": buffer.width, "height": buffer.height, "bytes": buffer.data.len() })
        }
        Response::Screen(info) => serde_json::to_value(info)?,
        Response::Screens(infos) => serde_json::to_value(infos)?,
        Response::ScreenIds(ids) => serde_json::to_value(ids)?,
        Response::ScreenGroup(info) => serde_json::to_value(info)?,
        Response::ColorGamuts(result) => serde_json::to_value(result?)?,
        Response::ColorGamut(result) => serde_json::to_value(result?)?,
        Response::GamutMap(result) => serde_json::to_value(result?)?,
        Response::Foldable(foldable) => json!({ "foldable": foldable }),
        Response::FoldStatus(status) => json!({ "fold_status": status }),
        Response::FoldDisplayMode(mode) => json!({ "fold_display_mode": mode }),
        Response::CreaseRegion(region) => serde_json::to_value(region)?,
        Response::Event(event) => serde_json::to_value(event)?,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["dmsctl"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).command
    }

    #[test]
    fn test_parse_point_accepts_negative_coordinates() {
        assert_eq!(parse_point("-1080, 0"), Ok(Point::new(-1080, 0)));
        assert!(parse_point("1920").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn test_expand_pairs_screens_with_points_in_order() {
        // Arrange
        let command = parse(&["expand", "--screen", "0", "--at", "0,0", "--screen", "3", "--at", "-1280,0"]);

        // Act
        let request = command.to_request();

        // Assert
        assert_eq!(
            request,
            Some(Request::MakeExpand {
                ids: vec![ScreenId(0), ScreenId(3)],
                points: vec![Point::ORIGIN, Point::new(-1280, 0)],
            })
        );
    }

    #[test]
    fn test_mirror_maps_main_and_targets() {
        let request = parse(&["mirror", "0", "2", "4"]).to_request();

        assert_eq!(
            request,
            Some(Request::MakeMirror {
                main: ScreenId(0),
                targets: vec![ScreenId(2), ScreenId(4)],
            })
        );
    }

    #[test]
    fn test_fold_commands_map_to_fold_requests() {
        assert_eq!(
            parse(&["set-fold-mode", "main"]).to_request(),
            Some(Request::SetFoldDisplayMode(FoldDisplayMode::Main))
        );
        assert_eq!(
            parse(&["lock-fold", "true"]).to_request(),
            Some(Request::LockFoldDisplayStatus(true))
        );
    }

    #[test]
    fn test_create_virtual_carries_density() {
        let Some(Request::CreateVirtualScreen(option)) =
            parse(&["create-virtual", "cast", "1280", "720", "--density", "2"]).to_request()
        else {
            panic!("expected a create request");
        };

        assert_eq!((option.width, option.height), (1280, 720));
        assert_eq!(option.density, 2.0);
    }

    #[test]
    fn test_watch_sends_no_request_and_defaults_to_all_kinds() {
        let command = parse(&["watch"]);

        assert_eq!(command.to_request(), None);
        assert_eq!(command.watch_kinds().len(), 4);
        assert_eq!(
            parse(&["watch", "--kind", "fold-status"]).watch_kinds(),
            vec![ListenerKind::FoldStatus]
        );
    }

    #[test]
    fn test_render_status_error_keeps_service_code() {
        // Arrange
        let error = DmError::invalid("points and ids differ in length");
        let code = error.code();

        // Act
        let result = render(Response::Status(Err(error)));

        // Assert
        assert!(matches!(result, Err(CommandError::Service { code: c, .. }) if c == code));
    }

    #[test]
    fn test_render_created_screen_and_missing_entities() {
        assert_eq!(
            render(Response::CreatedScreen(Ok(ScreenId(4)))).unwrap(),
            json!({ "screen_id": 4 })
        );
        assert_eq!(render(Response::Screen(None)).unwrap(), Value::Null);
    }
}
