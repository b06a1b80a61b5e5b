use std::io::Write as _;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use decoct_errors::Renderer;
use decoct_patch::{CompileError, CompileOptions, Stage, compile};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "decoct", version, about = "Patches CoffeeScript into JavaScript")]
enum Options {
    /// Compiles a file and prints or writes the result.
    Compile {
        path: Utf8PathBuf,
        /// Last stage to run.
        #[arg(long, value_enum, default_value_t = StageArg::Main)]
        stage: StageArg,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
    /// Reports diagnostics without producing output.
    Check { path: Utf8PathBuf },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StageArg {
    Normalize,
    Main,
}

impl From<StageArg> for Stage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Normalize => Self::Normalize,
            StageArg::Main => Self::Main,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("decoct=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match Options::parse() {
        Options::Compile { path, stage, output } => {
            let options = CompileOptions { stage: stage.into() };
            let code = run(&path, &options)?;
            match output {
                Some(output) => std::fs::write(&output, code)
                    .with_context(|| format!("failed to write `{output}`"))?,
                None => std::io::stdout()
                    .lock()
                    .write_all(code.as_bytes())
                    .context("failed to write to stdout")?,
            }
            Ok(())
        }
        Options::Check { path } => {
            run(&path, &CompileOptions::default())?;
            Ok(())
        }
    }
}

fn run(path: &Utf8Path, options: &CompileOptions) -> anyhow::Result<String> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read `{path}`"))?;

    tracing::debug!(%path, stage = %options.stage, "compiling");
    compile(&text, options).map_err(|error| {
        report(path, &error);
        anyhow::Error::new(error).context(format!("failed to compile `{path}`"))
    })
}

/// Prints the diagnostics of a failed stage against the text that stage saw.
fn report(path: &Utf8Path, error: &CompileError) {
    let origin = match error.stage() {
        Stage::Normalize => path.to_string(),
        stage => format!("{path} ({stage} stage input)"),
    };

    let renderer = Renderer::styled();
    for diagnostic in error.diagnostics() {
        eprintln!("{}", diagnostic.render(&renderer, &origin, error.text()));
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn verify_cli() {
        Options::command().debug_assert();
    }

    #[test]
    fn stage_defaults_to_main() {
        let options = Options::try_parse_from(["decoct", "compile", "a.coffee"]).unwrap();
        let Options::Compile { path, stage, output } = options else { panic!("expected compile") };
        assert_eq!(path, "a.coffee");
        assert!(stage == StageArg::Main);
        assert_eq!(output, None);
    }

    #[test]
    fn parses_stage_and_output() {
        let options = Options::try_parse_from([
            "decoct",
            "compile",
            "a.coffee",
            "--stage",
            "normalize",
            "-o",
            "a.js",
        ])
        .unwrap();
        let Options::Compile { stage, output, .. } = options else { panic!("expected compile") };
        assert_eq!(Stage::from(stage), Stage::Normalize);
        assert_eq!(output.as_deref(), Some(Utf8Path::new("a.js")));
    }
}
