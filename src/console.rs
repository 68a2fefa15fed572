//! Line-oriented front end for the `orgchart` binary.
//!
//! Reads one command per line, applies it to the session and prints the
//! resulting screen as plain text.

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::contact::{chat_link, initials, mail_link, office_label};
use crate::filters::ALPHABET;
use crate::session::{ListingSummary, OrgChartSession};
use crate::state;
use crate::types::{OrgUser, ViewMode};

const HELP: &str = "\
commands:
  tree | grid            switch view mode
  search [text]          edit the search box (empty clears it)
  dept [name]            department filter (no name = all departments)
  loc [name]             location filter
  title [text]           job title filter
  letter [A-Z]           toggle the letter strip (no letter = all)
  expand <id>            expand or collapse a manager
  hover [id]             show a contact card
  company | team         reload the whole company or your own team
  focus <id>             re-root the chart on someone's chain
  root [email]           pin the company chart to someone (saved to config)
  meta                   departments and locations
  stats                  directory call diagnostics
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tree,
    Grid,
    Search(String),
    Department(Option<String>),
    Location(Option<String>),
    Title(Option<String>),
    Letter(Option<char>),
    Expand(String),
    Hover(Option<String>),
    Company,
    Team,
    Focus(String),
    Root(Option<String>),
    Meta,
    Stats,
    Help,
    Quit,
}

fn optional(arg: &str) -> Option<String> {
    let arg = arg.trim();
    if arg.is_empty() {
        None
    } else {
        Some(arg.to_string())
    }
}

fn required(name: &str, arg: &str) -> Result<String, String> {
    optional(arg).ok_or_else(|| format!("{} needs an id", name))
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match word.to_ascii_lowercase().as_str() {
            "tree" => Ok(Command::Tree),
            "grid" => Ok(Command::Grid),
            // The search box keeps inner spacing as typed.
            "search" => Ok(Command::Search(arg.trim_start().to_string())),
            "dept" => Ok(Command::Department(optional(arg))),
            "loc" => Ok(Command::Location(optional(arg))),
            "title" => Ok(Command::Title(optional(arg))),
            "letter" => {
                let arg = arg.trim();
                let mut chars = arg.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => Ok(Command::Letter(None)),
                    (Some(c), None) if ALPHABET.contains(&c.to_ascii_uppercase()) => {
                        Ok(Command::Letter(Some(c.to_ascii_uppercase())))
                    }
                    _ => Err(format!("not a letter: {}", arg)),
                }
            }
            "expand" => required("expand", arg).map(Command::Expand),
            "hover" => Ok(Command::Hover(optional(arg))),
            "company" => Ok(Command::Company),
            "team" => Ok(Command::Team),
            "focus" => required("focus", arg).map(Command::Focus),
            "root" => Ok(Command::Root(optional(arg))),
            "meta" => Ok(Command::Meta),
            "stats" => Ok(Command::Stats),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command: {} (try help)", other)),
        }
    }
}

/// Drive the session from `input` until it ends or `quit`.
///
/// `config_path` is where `root` persists its change.
pub async fn run_console<R: BufRead, W: Write>(
    session: &OrgChartSession,
    config_path: &Path,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    render(session, out)?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{}", message)?;
                continue;
            }
        };
        log::debug!("OrgChart[{}]: console command {:?}", session.id(), command);
        match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            Command::Meta => {
                render_metadata(session, out)?;
                continue;
            }
            Command::Stats => {
                let snapshot = session.diagnostics();
                let json = serde_json::to_string_pretty(&snapshot)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                writeln!(out, "{}", json)?;
                continue;
            }
            Command::Tree => session.set_view_mode(ViewMode::Tree),
            Command::Grid => session.set_view_mode(ViewMode::Grid),
            Command::Search(text) => session.search_input(&text).await,
            Command::Department(name) => session.select_department(name.as_deref()).await,
            Command::Location(name) => session.select_location(name.as_deref()).await,
            Command::Title(text) => session.select_title(text.as_deref()).await,
            Command::Letter(letter) => session.toggle_letter(letter).await,
            Command::Expand(id) => session.toggle_expand(&id),
            Command::Hover(id) => session.set_hovered(id.as_deref()),
            Command::Company => session.show_company().await,
            Command::Team => session.show_my_team().await,
            Command::Focus(id) => session.focus_on(&id).await,
            Command::Root(email) => {
                match state::create_or_update_config(config_path, |c| c.root_user_email = email) {
                    Ok(config) => {
                        session.update_config(config);
                        session.show_company().await;
                    }
                    Err(e) => {
                        writeln!(out, "{}", e)?;
                        continue;
                    }
                }
            }
        }
        render(session, out)?;
    }
    Ok(())
}

pub fn render<W: Write>(session: &OrgChartSession, out: &mut W) -> io::Result<()> {
    let snapshot = session.snapshot();
    let config = session.config();
    writeln!(out)?;

    let filters = &snapshot.filters;
    let mut active = Vec::new();
    if !filters.search_text.is_empty() {
        active.push(format!("search=\"{}\"", filters.search_text));
    }
    if let Some(dept) = &filters.department {
        active.push(format!("dept={}", dept));
    }
    if let Some(loc) = &filters.location {
        active.push(format!("loc={}", loc));
    }
    if let Some(title) = &filters.title {
        active.push(format!("title={}", title));
    }
    if let Some(letter) = filters.letter {
        active.push(format!("letter={}", letter));
    }
    if !active.is_empty() {
        writeln!(out, "filters: {}", active.join(" "))?;
    }

    if snapshot.loading {
        writeln!(out, "loading...")?;
    }
    for failure in &snapshot.failures {
        writeln!(out, "{} failed: {}", failure.operation, failure.message)?;
    }

    match snapshot.summary {
        ListingSummary::Searching => writeln!(out, "searching...")?,
        ListingSummary::NoResults => writeln!(out, "no people match these filters")?,
        ListingSummary::Matches(n) => writeln!(out, "{} result(s)", n)?,
        ListingSummary::Total(n) => writeln!(out, "{} people", n)?,
    }

    if session.shows_listing() {
        for user in session.listing() {
            writeln!(out, "{}", listing_line(&user, &config.default_office_label))?;
        }
    } else if !snapshot.has_tree {
        writeln!(out, "(no chart loaded)")?;
    } else {
        for row in session.tree_rows() {
            let marker = match (row.has_children, row.expanded) {
                (false, _) => "   ",
                (true, true) => "[-]",
                (true, false) => "[+]",
            };
            let pointer = if row.hovered { ">" } else { " " };
            writeln!(
                out,
                "{}{}{} {} ({}) [{}]",
                pointer,
                "  ".repeat(row.depth),
                marker,
                row.user.display_name,
                row.user.job_title,
                row.user.id
            )?;
        }
    }

    if let Some(hovered) = snapshot.view.hovered.as_deref() {
        let card = session
            .listing()
            .into_iter()
            .chain(session.results())
            .find(|u| u.id == hovered);
        if let Some(user) = card {
            render_card(&user, &config.default_office_label, out)?;
        }
    }
    Ok(())
}

fn listing_line(user: &OrgUser, default_office: &str) -> String {
    format!(
        "{:<4}{} - {} - {} [{}]",
        initials(&user.display_name),
        user.display_name,
        user.job_title,
        office_label(user, default_office),
        user.id
    )
}

fn render_card<W: Write>(user: &OrgUser, default_office: &str, out: &mut W) -> io::Result<()> {
    writeln!(out, "+ {} ({})", user.display_name, initials(&user.display_name))?;
    writeln!(out, "| {}", user.job_title)?;
    writeln!(out, "| {}", office_label(user, default_office))?;
    if let Some(link) = mail_link(user) {
        writeln!(out, "| {}", link)?;
    }
    if let Some(link) = chat_link(user) {
        writeln!(out, "| {}", link)?;
    }
    Ok(())
}

fn render_metadata<W: Write>(session: &OrgChartSession, out: &mut W) -> io::Result<()> {
    let metadata = session.metadata();
    writeln!(out, "departments:")?;
    for dept in &metadata.departments {
        writeln!(out, "  {} ({})", dept.name, dept.count)?;
    }
    writeln!(out, "locations:")?;
    for loc in &metadata.locations {
        writeln!(out, "  {}", loc)?;
    }
    Ok(())
}
