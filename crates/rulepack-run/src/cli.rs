use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, miette};
use rulepack_lang::{
    HostExpr, HostPrinter, Lifter, Lowerer, OperatorRegistry, Options, Packer, RuleExpr, Shared, SourcePrinter,
};
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const DEFAULT_LOG_FILTER: &str = "rulepack_lang=warn,rulepack_run=warn";
const VERBOSE_LOG_FILTER: &str = "rulepack_lang=debug,rulepack_run=debug";

#[derive(Parser, Debug)]
#[command(name = "rulepack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## To translate a rule into host source:\n\
    rulepack lower rule.json\n\n\
    ## To translate a host expression back into a rule:\n\
    rulepack lift --text expr.json\n\n\
    ## To pack a rule with its operator bodies:\n\
    rulepack pack -o logged=logged.json rule.json\n\n\
    ## To read the rule from stdin:\n\
    cat rule.json | rulepack vars -")]
#[command(
    about = "rulepack translates rule expressions into host code and packs them into self-contained closures.",
    long_about = None
)]
pub struct Cli {
    #[clap(flatten)]
    options: OptionArgs,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[clap(subcommand)]
    commands: Commands,
}

#[derive(Clone, Debug, clap::Args, Default)]
struct OptionArgs {
    /// Load options and operator bodies from a TOML file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prefix for renamed operator calls and their bindings
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Leave calls of operators without a body unrenamed instead of failing
    #[arg(long, global = true, default_value_t = false)]
    lenient: bool,

    /// Deepest expression nesting to accept
    #[arg(long, global = true)]
    max_depth: Option<u32>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Translate a rule (JSON) into a host expression
    Lower {
        /// Print the host expression tree as JSON instead of source
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Path to the rule file, or `-` for stdin
        file: PathBuf,
    },
    /// Translate a host expression (JSON) back into a rule
    Lift {
        /// Print rule text instead of JSON
        #[arg(long, default_value_t = false)]
        text: bool,
        /// Path to the host expression file, or `-` for stdin
        file: PathBuf,
    },
    /// Lower a rule (JSON) and pack it with its operator bodies into a closure
    Pack {
        /// Operator body as a host expression JSON file
        #[arg(short = 'o', long = "operator", value_name = "NAME=FILE", value_parser = parse_operator)]
        operators: Vec<(String, PathBuf)>,
        /// Number of spaces for indentation
        #[arg(short, long, default_value_t = 4)]
        indent_width: usize,
        /// Path to the rule file, or `-` for stdin
        file: PathBuf,
    },
    /// List the context variables a rule (JSON) reads, in packing order
    Vars {
        /// Path to the rule file, or `-` for stdin
        file: PathBuf,
    },
}

fn parse_operator(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name.to_string(), PathBuf::from(path))),
        _ => Err(format!("expected NAME=FILE, got `{}`", value)),
    }
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        self.init_tracing();

        let config = match &self.options.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let options = self.resolve_options(&config.options)?;

        let stdout = io::stdout();
        let mut handle = BufWriter::new(stdout.lock());

        match &self.commands {
            Commands::Lower { json, file } => {
                let rule = Self::read_rule(file)?;
                let expr = Lowerer::new(options).lower(&rule)?;

                if *json {
                    writeln!(handle, "{}", expr.to_json().into_diagnostic()?).into_diagnostic()?;
                } else {
                    writeln!(handle, "{}", SourcePrinter::default().print_expr(&expr)).into_diagnostic()?;
                }
            }
            Commands::Lift { text, file } => {
                let expr = Self::read_host_expr(file)?;
                let rule = Lifter::new(options).lift(&expr)?;

                if *text {
                    writeln!(handle, "{}", rule).into_diagnostic()?;
                } else {
                    writeln!(handle, "{}", rule.to_json().into_diagnostic()?).into_diagnostic()?;
                }
            }
            Commands::Pack {
                operators,
                indent_width,
                file,
            } => {
                let rule = Self::read_rule(file)?;
                let expr = Lowerer::new(options.clone()).lower(&rule)?;
                let registry = Self::load_operators(config.operators.iter().chain(operators.iter().map(|(n, p)| (n, p))))?;

                let closure = Packer::new(options).pack(&expr, &registry)?;
                writeln!(handle, "{}", SourcePrinter::new(*indent_width).print_closure(&closure)).into_diagnostic()?;
            }
            Commands::Vars { file } => {
                let rule = Self::read_rule(file)?;
                let expr = Lowerer::new(options).lower(&rule)?;

                for name in rulepack_lang::collect_variables(&expr) {
                    writeln!(handle, "{}", name).into_diagnostic()?;
                }
            }
        }

        handle.flush().into_diagnostic()
    }

    fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if self.verbose {
                VERBOSE_LOG_FILTER
            } else {
                DEFAULT_LOG_FILTER
            })
        });

        // A subscriber may already be installed when run more than once in a process.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }

    /// Flags take precedence over the config file.
    fn resolve_options(&self, base: &Options) -> miette::Result<Options> {
        let mut options = base.clone();

        if let Some(prefix) = &self.options.prefix {
            options.call_prefix = prefix.as_str().into();
        }
        if self.options.lenient {
            options.strict = false;
        }
        if let Some(max_depth) = self.options.max_depth {
            options.max_depth = max_depth;
        }

        options.validate()?;
        Ok(options)
    }

    fn load_operators<'a>(
        operators: impl Iterator<Item = (&'a String, &'a PathBuf)>,
    ) -> miette::Result<OperatorRegistry> {
        let mut registry = OperatorRegistry::new();

        for (name, path) in operators {
            let body = Self::read_host_expr(path)?;
            if registry.register(name, Shared::new(body)).is_some() {
                tracing::debug!(operator = %name, "operator body overridden");
            }
        }

        Ok(registry)
    }

    fn read_rule(file: &Path) -> miette::Result<RuleExpr> {
        let content = Self::read_input(file)?;
        RuleExpr::from_json(&content)
            .map_err(|e| miette!("Invalid rule in {}: {}", file.display(), e))
    }

    fn read_host_expr(file: &Path) -> miette::Result<HostExpr> {
        let content = Self::read_input(file)?;
        HostExpr::from_json(&content)
            .map_err(|e| miette!("Invalid host expression in {}: {}", file.display(), e))
    }

    fn read_input(file: &Path) -> miette::Result<String> {
        if file.as_os_str() == "-" {
            if io::stdin().is_terminal() {
                return Err(miette!("No input on stdin"));
            }

            let mut input = String::new();
            io::stdin().read_to_string(&mut input).into_diagnostic()?;
            return Ok(input);
        }

        if !file.exists() {
            return Err(miette!("File not found: {}", file.display()));
        }

        fs::read_to_string(file).into_diagnostic()
    }
}
