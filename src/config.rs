use crate::assets::{DEFAULT_JOIN_URL, DEFAULT_SERVER_URL, DEFAULT_SESSION_ID, PATTERN_HEIGHT, PATTERN_WIDTH};
use crate::utils::net::endpoint::random_username;
use crate::utils::net::session::{extract_session_id, generate_session_id};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use url::Url;

/// Where a student's frames come from.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraChoice {
    Pattern { width: u32, height: u32 },
    Still(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentConfig {
    pub username: String,
    pub session_id: String,
    pub server: Url,
    pub camera: CameraChoice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub session_id: String,
    pub server: Url,
    pub json: bool,
    pub prefill_history: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InviteConfig {
    pub session_id: String,
    pub join_url: Url,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Student(StudentConfig),
    Dashboard(DashboardConfig),
    Invite(InviteConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mode: Mode,
}

impl Config {
    pub fn command() -> Command {
        let session = Arg::new("session")
            .short('s')
            .long("session")
            .value_name("SESSION")
            .help("Session id, or an invite link carrying one.");
        let server = Arg::new("server")
            .long("server")
            .value_name("URL")
            .help("Base websocket URL of the session backend.")
            .default_value(DEFAULT_SERVER_URL);

        Command::new(app_name())
            .version(version())
            .author(env!("CARGO_PKG_AUTHORS"))
            .about(env!("CARGO_PKG_DESCRIPTION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(
                Command::new("student")
                    .about("Stream webcam frames into a session.")
                    .arg(
                        Arg::new("name")
                            .short('n')
                            .long("name")
                            .value_name("NAME")
                            .help("Display name. Defaults to a random student_<n>."),
                    )
                    .arg(session.clone())
                    .arg(server.clone())
                    .arg(
                        Arg::new("image")
                            .long("image")
                            .value_name("PATH")
                            .help("Serve this JPEG file as the camera.")
                            .value_parser(clap::value_parser!(PathBuf))
                            .conflicts_with("pattern"),
                    )
                    .arg(
                        Arg::new("pattern")
                            .long("pattern")
                            .value_name("WxH")
                            .help("Use a synthetic test pattern camera at this resolution."),
                    ),
            )
            .subcommand(
                Command::new("dashboard")
                    .about("Aggregate a session's event stream into live metrics.")
                    .arg(session.clone())
                    .arg(server)
                    .arg(
                        Arg::new("json")
                            .long("json")
                            .help("Print snapshots as JSON lines on stdout.")
                            .action(ArgAction::SetTrue),
                    )
                    .arg(
                        Arg::new("prefill-history")
                            .long("prefill-history")
                            .help("Start with a full window of zero engagement samples.")
                            .action(ArgAction::SetTrue),
                    ),
            )
            .subcommand(
                Command::new("invite")
                    .about("Print an invite link. Generates a session id if none is given.")
                    .arg(session)
                    .arg(
                        Arg::new("join-url")
                            .long("join-url")
                            .value_name("URL")
                            .default_value(DEFAULT_JOIN_URL),
                    ),
            )
    }

    /// Parses the process arguments. Exits on `--help`/`--version` or bad usage.
    pub fn from_args() -> Result<Config> {
        Self::from_matches(&Self::command().get_matches())
    }

    pub fn try_from_iter<I, T>(args: I) -> Result<Config>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Config> {
        let mode = match matches.subcommand() {
            Some(("student", m)) => {
                let camera = match (m.get_one::<PathBuf>("image"), m.get_one::<String>("pattern")) {
                    (Some(path), _) => CameraChoice::Still(path.clone()),
                    (None, Some(res)) => {
                        let (width, height) = parse_resolution(res)?;
                        CameraChoice::Pattern { width, height }
                    }
                    (None, None) => CameraChoice::Pattern {
                        width: PATTERN_WIDTH,
                        height: PATTERN_HEIGHT,
                    },
                };
                Mode::Student(StudentConfig {
                    username: m.get_one::<String>("name").cloned().unwrap_or_else(random_username),
                    session_id: session_of(m).unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
                    server: websocket_url(m)?,
                    camera,
                })
            }
            Some(("dashboard", m)) => Mode::Dashboard(DashboardConfig {
                session_id: session_of(m).unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
                server: websocket_url(m)?,
                json: m.get_flag("json"),
                prefill_history: m.get_flag("prefill-history"),
            }),
            Some(("invite", m)) => {
                let join_url = m
                    .get_one::<String>("join-url")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_JOIN_URL);
                Mode::Invite(InviteConfig {
                    session_id: session_of(m).unwrap_or_else(generate_session_id),
                    join_url: Url::parse(join_url).with_context(|| format!("invalid join URL {:?}", join_url))?,
                })
            }
            _ => bail!("no command given"),
        };
        Ok(Config { mode })
    }
}

fn session_of(m: &ArgMatches) -> Option<String> {
    m.get_one::<String>("session")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(extract_session_id)
}

fn websocket_url(m: &ArgMatches) -> Result<Url> {
    let raw = m
        .get_one::<String>("server")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SERVER_URL);
    let url = Url::parse(raw).with_context(|| format!("invalid server URL {:?}", raw))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(anyhow!("server URL must use ws or wss, got {}", other)),
    }
}

/// `"640x480"` → `(640, 480)`
pub fn parse_resolution(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("resolution {:?} is not WIDTHxHEIGHT", s))?;
    let width: u32 = w.trim().parse().with_context(|| format!("bad width in {:?}", s))?;
    let height: u32 = h.trim().parse().with_context(|| format!("bad height in {:?}", s))?;
    if width == 0 || height == 0 {
        bail!("resolution {:?} has no area", s);
    }
    Ok((width, height))
}

/// Returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}
