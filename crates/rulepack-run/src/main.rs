use clap::Parser;

fn main() -> miette::Result<()> {
    rulepack_run::Cli::parse().run()
}
