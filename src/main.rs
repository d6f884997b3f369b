use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use log::warn;

use archive::ArchiveRequest;
use context::{Context, TableStyle};
use record::{parse_score, Status};
use scan::Filters;

mod archive;
mod context;
mod index;
mod pdf;
mod record;
mod renderer;
mod report;
mod scan;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("base_dir")
                .long("base-dir")
                .global(true)
                .help("Archive root holding published/ and templates/")
                .value_parser(value_parser!(PathBuf))
                .default_value("."),
        )
        .subcommand(
            Command::new("archive")
                .about("Archive a published article with PDF snapshot, source copy, and metadata")
                .args([
                    Arg::new("source")
                        .long("source")
                        .help("Path to the source markdown file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                    Arg::new("url")
                        .long("url")
                        .help("Published article URL")
                        .required(true),
                    Arg::new("project")
                        .long("project")
                        .help("Project name (e.g. \"nfl\", \"ratings\")")
                        .required(true),
                    Arg::new("title").long("title").help("Article title").required(true),
                    Arg::new("score")
                        .long("score")
                        .help("GEO score, \"97\" or \"97/100\""),
                    Arg::new("pages_url")
                        .long("pages-url")
                        .help("Secondary (GitHub Pages) URL"),
                ]),
        )
        .subcommand(
            Command::new("track")
                .about("Cross-project view of published and pending articles")
                .args([
                    Arg::new("list")
                        .long("list")
                        .help("Print the article table (default action)")
                        .action(ArgAction::SetTrue),
                    Arg::new("status")
                        .long("status")
                        .help("Filter by status")
                        .value_parser(["published", "pending"]),
                    Arg::new("project")
                        .long("project")
                        .help("Filter by project name (case-insensitive)"),
                    Arg::new("json")
                        .long("json")
                        .help("Export JSON, to PATH or stdout")
                        .value_name("PATH")
                        .num_args(0..=1)
                        .default_missing_value("-"),
                    Arg::new("html")
                        .long("html")
                        .help("Generate the HTML dashboard")
                        .action(ArgAction::SetTrue),
                    Arg::new("plain")
                        .long("plain")
                        .help("Force the fixed-width table")
                        .action(ArgAction::SetTrue),
                    Arg::new("projects_root")
                        .long("projects-root")
                        .help("Root to scan for pending markers (default: parent of base dir)")
                        .value_parser(value_parser!(PathBuf)),
                ]),
        )
        .subcommand(
            Command::new("reindex")
                .about("Rebuild INDEX.md and the dashboard from all metadata records"),
        )
        .get_matches();

    let base_dir: &PathBuf = matches.get_one("base_dir").unwrap();

    match matches.subcommand() {
        Some(("archive", sub)) => run_archive(base_dir.clone(), sub),
        Some(("track", sub)) => run_track(base_dir.clone(), sub),
        Some(("reindex", _)) => {
            let ctx = Context::new(base_dir.clone(), base_dir.join(".."), TableStyle::Plain);
            index::regenerate(&ctx)
        }
        _ => unreachable!(),
    }
}

fn run_archive(base_dir: PathBuf, sub: &ArgMatches) -> anyhow::Result<()> {
    let geo_score = match sub.get_one::<String>("score") {
        Some(raw) => {
            let parsed = parse_score(raw);
            if parsed.is_none() {
                warn!("ignoring unparseable score {raw:?}");
            }
            parsed
        }
        None => None,
    };

    let request = ArchiveRequest {
        source: sub.get_one::<PathBuf>("source").unwrap().clone(),
        publish_url: sub.get_one::<String>("url").unwrap().clone(),
        project: sub.get_one::<String>("project").unwrap().clone(),
        title: sub.get_one::<String>("title").unwrap().clone(),
        geo_score,
        pages_url: sub.get_one::<String>("pages_url").cloned(),
    };

    let ctx = Context::new(base_dir.clone(), base_dir.join(".."), TableStyle::Plain);
    archive::archive(&ctx, request)
}

fn run_track(base_dir: PathBuf, sub: &ArgMatches) -> anyhow::Result<()> {
    let projects_root = sub
        .get_one::<PathBuf>("projects_root")
        .cloned()
        .unwrap_or_else(|| base_dir.join(".."));

    let style = if sub.get_flag("plain") || !std::io::stdout().is_terminal() {
        TableStyle::Plain
    } else {
        TableStyle::Fancy
    };
    let ctx = Context::new(base_dir, projects_root, style);

    let filters = Filters {
        status: sub.get_one::<String>("status").map(|s| match s.as_str() {
            "published" => Status::Published,
            _ => Status::Pending,
        }),
        project: sub.get_one::<String>("project").cloned(),
    };
    let articles = scan::collect(&ctx, &filters);

    let json = sub.get_one::<String>("json");
    let html = sub.get_flag("html");
    if sub.get_flag("list") || (json.is_none() && !html) {
        report::print_table(&articles, ctx.table_style);
    }
    if let Some(target) = json {
        let output = (target.as_str() != "-").then(|| PathBuf::from(target));
        report::export_json(&articles, output.as_deref())?;
    }
    if html {
        renderer::render_dashboard(&ctx, &articles)?;
    }
    Ok(())
}
