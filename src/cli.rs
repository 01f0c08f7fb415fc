//! # Command Line
//!
//! Flags are declared once in [`FLAGS`]: names, value shape and help text.
//! The clap command is built from that table and [`Invocation::from_matches`]
//! reads every field back by id, so there is no reflection-style binding and
//! the whole surface is visible in one place.

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::warn;

use crate::analysis::analyze_repo_async;
use crate::config::{AnalysisOptions, Configuration};
use crate::plugins::PluginKind;
use crate::report::{render_page, write_page, PageOptions};

/// How a flag takes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagShape {
    /// Boolean switch.
    Switch,
    /// Counted switch (`-vv`).
    Count,
    /// One value.
    Single,
    /// Comma separated values, flag may repeat.
    List,
    /// One value per occurrence, flag may repeat.
    Repeated,
    /// One path.
    Path,
    /// Path per occurrence, flag may repeat.
    Paths,
}

/// One row of the flag table.
#[derive(Debug)]
pub struct Flag {
    pub id: &'static str,
    pub short: Option<char>,
    pub long: &'static str,
    pub value_name: &'static str,
    pub shape: FlagShape,
    pub help: &'static str,
}

pub const FLAGS: &[Flag] = &[
    Flag {
        id: "plugins",
        short: Some('p'),
        long: "plugins",
        value_name: "PLUGIN,...",
        shape: FlagShape::List,
        help: "Plugins to run, in rendering order",
    },
    Flag {
        id: "branch",
        short: Some('b'),
        long: "branch",
        value_name: "NAME",
        shape: FlagShape::Single,
        help: "Branch to inspect (default: current branch)",
    },
    Flag {
        id: "start",
        short: None,
        long: "start",
        value_name: "DATE",
        shape: FlagShape::Single,
        help: "Ignore commits before this date",
    },
    Flag {
        id: "end",
        short: None,
        long: "end",
        value_name: "DATE",
        shape: FlagShape::Single,
        help: "Ignore commits after this date; a bare date means 00:00 on that day",
    },
    Flag {
        id: "format",
        short: None,
        long: "format",
        value_name: "FORMAT",
        shape: FlagShape::Single,
        help: "Date format for --start, --end and rendered dates (default: %d/%m/%Y)",
    },
    Flag {
        id: "alias",
        short: None,
        long: "alias",
        value_name: "Name_Of_Author,MAIL,...",
        shape: FlagShape::Repeated,
        help: "Declare every mail of one author; underscores in the name become spaces",
    },
    Flag {
        id: "blacklist",
        short: None,
        long: "blacklist",
        value_name: "MAIL,...",
        shape: FlagShape::List,
        help: "Exclude these mails and every alias of their authors",
    },
    Flag {
        id: "whitelist",
        short: None,
        long: "whitelist",
        value_name: "MAIL,...",
        shape: FlagShape::List,
        help: "Only keep authors owning one of these mails",
    },
    Flag {
        id: "strict",
        short: None,
        long: "strict",
        value_name: "",
        shape: FlagShape::Switch,
        help: "Fail on malformed log records instead of skipping them",
    },
    Flag {
        id: "load",
        short: None,
        long: "load",
        value_name: "FILE",
        shape: FlagShape::Path,
        help: "Load options saved with --save; explicit flags win",
    },
    Flag {
        id: "save",
        short: None,
        long: "save",
        value_name: "FILE",
        shape: FlagShape::Path,
        help: "Save the options of this run",
    },
    Flag {
        id: "title",
        short: None,
        long: "title",
        value_name: "TITLE",
        shape: FlagShape::Single,
        help: "Title of the generated page; underscores become spaces",
    },
    Flag {
        id: "css",
        short: None,
        long: "css",
        value_name: "FILE",
        shape: FlagShape::Paths,
        help: "Stylesheet to inline into the generated page",
    },
    Flag {
        id: "output",
        short: Some('o'),
        long: "output",
        value_name: "FILE",
        shape: FlagShape::Path,
        help: "Write an HTML report and print its path",
    },
    Flag {
        id: "json",
        short: None,
        long: "json",
        value_name: "",
        shape: FlagShape::Switch,
        help: "Print results as JSON",
    },
    Flag {
        id: "list_plugins",
        short: None,
        long: "list-plugins",
        value_name: "",
        shape: FlagShape::Switch,
        help: "Print the available plugins and exit",
    },
    Flag {
        id: "verbose",
        short: Some('v'),
        long: "verbose",
        value_name: "",
        shape: FlagShape::Count,
        help: "Increase log verbosity (-v, -vv)",
    },
];

impl Flag {
    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.id).long(self.long).help(self.help);
        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        match self.shape {
            FlagShape::Switch => arg.action(ArgAction::SetTrue),
            FlagShape::Count => arg.action(ArgAction::Count),
            FlagShape::Single => arg.value_name(self.value_name).action(ArgAction::Set),
            FlagShape::List => arg
                .value_name(self.value_name)
                .value_delimiter(',')
                .action(ArgAction::Append),
            FlagShape::Repeated => arg.value_name(self.value_name).action(ArgAction::Append),
            FlagShape::Path => arg
                .value_name(self.value_name)
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set),
            FlagShape::Paths => arg
                .value_name(self.value_name)
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Append),
        }
    }
}

/// The clap command built from [`FLAGS`].
pub fn command() -> Command {
    let command = Command::new("visulog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tool for analysis and visualization of git logs")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .help("Repository to analyze (default: current directory)")
                .value_parser(value_parser!(PathBuf)),
        );
    FLAGS
        .iter()
        .fold(command, |command, flag| command.arg(flag.to_arg()))
        .mut_arg("json", |arg| arg.conflicts_with("output"))
}

/// Everything one command line asks for.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub options: AnalysisOptions,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub list_plugins: bool,
    pub verbosity: u8,
}

impl Invocation {
    pub fn parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let strings = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|values| {
                    values
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        };
        let string = |id: &str| matches.get_one::<String>(id).cloned();
        let path = |id: &str| matches.get_one::<PathBuf>(id).cloned();

        let options = AnalysisOptions {
            path: path("path"),
            plugins: strings("plugins"),
            branch: string("branch"),
            start: string("start"),
            end: string("end"),
            format: string("format"),
            aliases: strings("alias"),
            blacklist: strings("blacklist"),
            whitelist: strings("whitelist"),
            strict: matches.get_flag("strict"),
            title: string("title"),
            css: matches
                .get_many::<PathBuf>("css")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        };

        Self {
            options,
            load: path("load"),
            save: path("save"),
            output: path("output"),
            json: matches.get_flag("json"),
            list_plugins: matches.get_flag("list_plugins"),
            verbosity: matches.get_count("verbose"),
        }
    }
}

/// Execute one invocation.
pub async fn run(invocation: Invocation) -> anyhow::Result<()> {
    if invocation.list_plugins {
        let ids: Vec<&str> = PluginKind::ALL.iter().map(|kind| kind.id()).collect();
        println!("{}", ids.join(","));
        return Ok(());
    }

    let mut options = invocation.options;
    if let Some(load) = &invocation.load {
        let saved = AnalysisOptions::load(load)
            .with_context(|| format!("loading {}", load.display()))?;
        options = options.over(saved);
    }

    let config = Configuration::from_options(&options)?;

    if let Some(save) = &invocation.save {
        options
            .save(save)
            .with_context(|| format!("saving {}", save.display()))?;
    }

    if config.plugins().is_empty() {
        warn!("no plugin selected, nothing to analyze");
        return Ok(());
    }

    let result = analyze_repo_async(&config).await?;

    if invocation.json {
        println!("{}", result.to_json()?);
    } else if let Some(output) = &invocation.output {
        let page = PageOptions::with_css_files(options.title.clone(), &options.css)
            .context("reading stylesheets")?;
        write_page(output, &render_page(&result, &page))
            .with_context(|| format!("writing {}", output.display()))?;
        println!("{}", output.display());
    } else {
        for (_, plugin) in result.iter() {
            println!("{}: {}", plugin.name(), plugin.as_display_string());
        }
    }

    Ok(())
}

/// Process exit code for a failed run.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<crate::Error>()
        .map(|e| e.kind().exit_code())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flag_table_builds_a_valid_command() {
        command().debug_assert();
    }

    #[test]
    fn flag_ids_are_unique() {
        let mut ids: Vec<&str> = FLAGS.iter().map(|f| f.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), FLAGS.len());
    }

    #[test]
    fn parses_a_full_command_line() {
        let invocation = Invocation::parse_from([
            "visulog",
            "repo",
            "-p",
            "commits-per-author,type-of-progression",
            "--plugins=merge-commits-per-author",
            "-b",
            "develop",
            "--start",
            "01/01/2023",
            "--alias",
            "Alice_L,alice@x,a@home",
            "--alias",
            "Bob,bob@y",
            "--blacklist",
            "spam@x,bot@x",
            "--strict",
            "--css",
            "a.css",
            "--css",
            "b.css",
            "-vv",
        ])
        .unwrap();

        let options = &invocation.options;
        assert_eq!(options.path, Some(PathBuf::from("repo")));
        assert_eq!(
            options.plugins,
            vec![
                "commits-per-author".to_string(),
                "type-of-progression".to_string(),
                "merge-commits-per-author".to_string()
            ]
        );
        assert_eq!(options.branch.as_deref(), Some("develop"));
        assert_eq!(options.start.as_deref(), Some("01/01/2023"));
        assert_eq!(options.end, None);
        assert_eq!(
            options.aliases,
            vec!["Alice_L,alice@x,a@home".to_string(), "Bob,bob@y".to_string()]
        );
        assert_eq!(options.blacklist, vec!["spam@x".to_string(), "bot@x".to_string()]);
        assert!(options.strict);
        assert_eq!(options.css.len(), 2);
        assert_eq!(invocation.verbosity, 2);
        assert!(!invocation.json);
    }

    #[test]
    fn defaults_are_empty() {
        let invocation = Invocation::parse_from(["visulog"]).unwrap();
        assert_eq!(invocation.options, AnalysisOptions::default());
        assert!(invocation.load.is_none());
        assert_eq!(invocation.verbosity, 0);
    }

    #[test]
    fn json_and_html_output_are_exclusive() {
        let err = Invocation::parse_from(["visulog", "--json", "-o", "report.html"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        assert!(Invocation::parse_from(["visulog", "--json"]).unwrap().json);
    }

    #[test]
    fn end_help_explains_date_only_bounds() {
        let end = FLAGS.iter().find(|flag| flag.id == "end").unwrap();
        assert!(end.help.contains("00:00 on that day"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Invocation::parse_from(["visulog", "--nope"]).is_err());
    }

    #[test]
    fn configuration_errors_map_to_their_exit_code() {
        let err: anyhow::Error = crate::Error::Configuration("bad".into()).into();
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::from(crate::Error::Parse("bad".into())).context("while loading");
        assert_eq!(exit_code(&err), 3);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }

    #[tokio::test]
    async fn run_without_plugins_is_a_no_op() {
        let invocation = Invocation::parse_from(["visulog", "/nonexistent/repo"]).unwrap();
        assert!(run(invocation).await.is_ok());
    }

    #[tokio::test]
    async fn run_with_unknown_plugin_fails_as_configuration_error() {
        let invocation =
            Invocation::parse_from(["visulog", "/nonexistent/repo", "-p", "bogus"]).unwrap();
        let err = run(invocation).await.unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[tokio::test]
    async fn run_on_missing_repository_is_source_unavailable() {
        let invocation = Invocation::parse_from([
            "visulog",
            "/nonexistent/repo",
            "-p",
            "commits-per-author",
        ])
        .unwrap();
        let err = run(invocation).await.unwrap_err();
        assert_eq!(exit_code(&err), 4);
    }
}
