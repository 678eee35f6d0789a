use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::conditions::MATCH_ANY_ATTRIBUTE;
use crate::config::{self, EnvironmentConfig};
use crate::element::{ElementRegistry, Flavor};
use crate::environment::{ColorScheme, Host, MediaType};
use crate::runner::{self, Trace};

use super::exit_codes;
use super::output::{self, EvalData, OutputMode, TagData, VerifyData};

#[derive(Parser)]
#[command(name = "show-when")]
#[command(about = "Evaluate conditional-visibility elements against a simulated host")]
#[command(version)]
pub struct Cli {
    /// Output in JSON format (auto-enabled when stdout is piped)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Force text output even when stdout is piped
    #[arg(long, global = true, conflicts_with = "json")]
    pub no_json: bool,

    /// Suppress all output on success (errors still go to stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate one element against a one-shot environment
    Eval {
        /// Element tag (only-show, show-when, hide-when)
        #[arg(short, long, default_value = "show-when")]
        tag: String,

        /// Element attribute as name=value (repeatable); a bare name sets an empty value
        #[arg(short, long = "attr", value_name = "NAME=VALUE", action = clap::ArgAction::Append)]
        attrs: Vec<String>,

        /// Switch the combinator to any (same as --attr match-any)
        #[arg(long)]
        any: bool,

        /// Page URL or relative "?query#fragment"
        #[arg(long, default_value = "/")]
        url: String,

        /// Preferred language, most preferred first (repeatable)
        #[arg(long = "lang", value_name = "LANG", action = clap::ArgAction::Append)]
        languages: Vec<String>,

        /// Report the host as offline
        #[arg(long)]
        offline: bool,

        /// Viewport width in px
        #[arg(long)]
        width: Option<u32>,

        /// Viewport height in px
        #[arg(long)]
        height: Option<u32>,

        /// Preferred color scheme: light or dark
        #[arg(long)]
        color_scheme: Option<String>,

        /// Prefer reduced motion
        #[arg(long)]
        reduced_motion: bool,

        /// Use the print media type
        #[arg(long)]
        print: bool,

        /// Supported declaration, e.g. "display: grid" or "gap: *" (repeatable)
        #[arg(long = "supports", value_name = "DECL", action = clap::ArgAction::Append)]
        supports: Vec<String>,
    },

    /// Run a scenario file and print the visibility trace
    Run {
        /// Scenario file (JSON or JSON5); defaults to SHOW_WHEN_SCENARIO
        scenario: Option<PathBuf>,
    },

    /// Verify a scenario file for errors
    Verify {
        /// Scenario file (JSON or JSON5); defaults to SHOW_WHEN_SCENARIO
        scenario: Option<PathBuf>,
    },

    /// List element definitions and their attributes
    Tags,

    /// Print shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn execute(cli: Cli) -> Result<()> {
    let output_mode = OutputMode::from_flags(cli.json, cli.no_json, cli.quiet);

    match cli.command {
        Commands::Eval {
            tag,
            attrs,
            any,
            url,
            languages,
            offline,
            width,
            height,
            color_scheme,
            reduced_motion,
            print,
            supports,
        } => {
            let mut env = EnvironmentConfig {
                url,
                online: !offline,
                supports,
                ..Default::default()
            };
            if !languages.is_empty() {
                env.languages = languages;
            }
            if let Some(width) = width {
                env.viewport.width = width;
            }
            if let Some(height) = height {
                env.viewport.height = height;
            }
            if let Some(scheme) = color_scheme {
                env.viewport.color_scheme = ColorScheme::parse(&scheme).unwrap_or_else(|| {
                    fail(
                        output_mode,
                        exit_codes::INVALID_ARGS,
                        &format!("invalid color scheme '{}': use light or dark", scheme),
                    )
                });
            }
            env.viewport.reduced_motion = reduced_motion;
            if print {
                env.viewport.media_type = MediaType::Print;
            }

            let mut attributes = Vec::with_capacity(attrs.len() + 1);
            for attr in &attrs {
                attributes.push(parse_attr(attr).unwrap_or_else(|e| {
                    fail(output_mode, exit_codes::INVALID_ARGS, &e.to_string())
                }));
            }
            if any {
                attributes.push((MATCH_ANY_ATTRIBUTE.to_string(), String::new()));
            }

            let host = runner::build_host(&env)
                .unwrap_or_else(|e| fail(output_mode, exit_codes::INVALID_ARGS, &e.to_string()));
            let host: Rc<dyn Host> = host;
            let mut element = ElementRegistry::with_defaults()
                .create(&tag, host)
                .unwrap_or_else(|e| fail(output_mode, exit_codes::INVALID_ARGS, &e.to_string()));
            for (name, value) in &attributes {
                element.set_attribute(name, value);
            }
            element.connect();

            let config = element.configuration();
            let evaluation = element.evaluation();
            let data = EvalData {
                tag: element.tag().to_string(),
                visible: element.is_visible(),
                matched: evaluation.matched,
                polarity: element.flavor().polarity(),
                combinator: evaluation.combinator,
                configuration: config.to_string(),
                predicates: evaluation
                    .outcomes
                    .into_iter()
                    .filter(|p| config.has(p.kind))
                    .collect(),
            };

            match output_mode {
                OutputMode::Json => output::print_json(&data),
                OutputMode::Text => print_eval_text(&data),
                OutputMode::Quiet => {}
            }
            Ok(())
        }

        Commands::Run { scenario } => {
            let path = scenario_path(output_mode, scenario.as_deref());
            let scenario = config::load(&path).unwrap_or_else(|e| {
                fail(output_mode, exit_codes::SCENARIO_ERROR, &format!("{:#}", e))
            });
            let trace = runner::run(&scenario).unwrap_or_else(|e| {
                fail(
                    output_mode,
                    exit_codes::SCENARIO_ERROR,
                    &format!("scenario failed: {}", e),
                )
            });

            match output_mode {
                OutputMode::Json => output::print_json(&trace),
                OutputMode::Text => print_trace_text(&trace),
                OutputMode::Quiet => {}
            }
            Ok(())
        }

        Commands::Verify { scenario } => {
            let path = scenario_path(output_mode, scenario.as_deref());
            let (loaded, errors) = config::verify(&path).unwrap_or_else(|e| {
                fail(output_mode, exit_codes::SCENARIO_ERROR, &format!("{:#}", e))
            });

            if errors.is_empty() {
                match output_mode {
                    OutputMode::Json => output::print_json(&VerifyData {
                        path: path.display().to_string(),
                        valid: true,
                        elements: loaded.elements.len(),
                        steps: loaded.steps.len(),
                    }),
                    OutputMode::Text => {
                        println!("✓ Scenario is valid: {}", path.display())
                    }
                    OutputMode::Quiet => {}
                }
                return Ok(());
            }

            let message = format!("scenario has {} error(s): {}", errors.len(), path.display());
            if output_mode.is_json() {
                output::print_json_error_with_problems(
                    exit_codes::SCENARIO_ERROR,
                    &message,
                    errors,
                    &path.display().to_string(),
                );
            } else {
                println!("✗ Scenario has {} error(s): {}", errors.len(), path.display());
                println!();
                for error in &errors {
                    println!("  - {}", error);
                }
            }
            std::process::exit(exit_codes::SCENARIO_ERROR);
        }

        Commands::Tags => {
            let registry = ElementRegistry::with_defaults();
            let tags: Vec<TagData> = registry
                .definitions()
                .map(|(tag, flavor)| tag_data(tag, flavor))
                .collect();

            match output_mode {
                OutputMode::Json => output::print_json(&tags),
                OutputMode::Text => {
                    for tag in &tags {
                        println!("{}", tag.tag);
                        println!("  {}", tag.description);
                        println!(
                            "  polarity: {}, live: {}",
                            tag.polarity.as_str(),
                            if tag.live { "yes" } else { "no" }
                        );
                        println!("  attributes: {}", tag.attributes.join(", "));
                    }
                }
                OutputMode::Quiet => {}
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "show-when", &mut io::stdout());
            Ok(())
        }
    }
}

/// print an error in the active output mode and exit
fn fail(output_mode: OutputMode, code: i32, message: &str) -> ! {
    if output_mode.is_json() {
        output::print_json_error(code, message);
    } else {
        eprintln!("Error: {}", message);
    }
    std::process::exit(code);
}

fn scenario_path(output_mode: OutputMode, arg: Option<&Path>) -> PathBuf {
    config::resolve_path(arg)
        .unwrap_or_else(|e| fail(output_mode, exit_codes::INVALID_ARGS, &e.to_string()))
}

/// split "name=value" on the first '='; a bare name has an empty value
fn parse_attr(s: &str) -> Result<(String, String)> {
    let (name, value) = s.split_once('=').unwrap_or((s, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("invalid attribute '{}': expected NAME=VALUE", s));
    }
    Ok((name.to_string(), value.to_string()))
}

fn tag_data(tag: &str, flavor: Flavor) -> TagData {
    let profile = flavor.profile();
    TagData {
        tag: tag.to_string(),
        polarity: profile.polarity,
        live: profile.live,
        attributes: flavor.observed_attributes(),
        description: profile.description,
    }
}

fn print_eval_text(data: &EvalData) {
    println!(
        "{} {}",
        data.tag,
        if data.visible { "visible" } else { "hidden" }
    );
    println!("  conditions: {}", data.configuration);
    for p in &data.predicates {
        println!("  {:<8} {}", p.kind.as_str(), p.outcome);
    }
}

fn print_trace_text(trace: &Trace) {
    if let Some(name) = &trace.name {
        println!("{}", name);
        println!();
    }
    for record in &trace.records {
        println!("[{}] {}", record.index, record.description);
        for event in &record.events {
            println!("  ~ {}", event.event_type);
        }
        for e in &record.elements {
            let state = if e.visible { "visible" } else { "hidden" };
            let marker = if e.changed { " *" } else { "" };
            let detached = if e.connected { "" } else { " (detached)" };
            println!("  {:<16} {}{}{}", e.id, state, marker, detached);
        }
    }
}
