use anyhow::Context;
use clap::Parser;
use quirk_compiler::{compile_to_ast, ir::ir_generator::lower};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quirkc")]
#[command(about = "Front end and IR lowering for the Quirk language")]
struct Args {
    /// Path to the source file to compile. Uses a built-in sample if omitted.
    file: Option<PathBuf>,

    /// Print the syntax tree. If none of --ast/--ir/--both is given, defaults to --ir.
    #[arg(long)]
    ast: bool,

    /// Print the lowered instruction tree
    #[arg(long)]
    ir: bool,

    /// Print both the syntax tree and the instruction tree
    #[arg(long)]
    both: bool,
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();

    let src = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?,
        None => DEFAULT_SAMPLE.trim().to_string(),
    };

    let want_ast = args.ast || args.both;
    let want_ir = args.ir || args.both || !want_ast;

    let ast = compile_to_ast(&src).context("compilation failed")?;
    tracing::info!(nodes = ast.len(), "parsed");

    if want_ast {
        for line in ast.to_lines() {
            println!("{line}");
        }
        if want_ir {
            println!();
        }
    }

    if want_ir {
        let ir = lower(&ast).context("lowering failed")?;
        for line in ir.to_lines() {
            println!("{line}");
        }
    }

    Ok(())
}

const DEFAULT_SAMPLE: &str = r#"
int limit = 3;
string greeting = "hello";
bool ready = true;

if (limit == 3) {
    out(greeting);
} else if (limit > 3) {
    out("big");
} else {
    out("small");
}

for (int i = 0; i < limit; i++) {
    out(i);
}
"#;
