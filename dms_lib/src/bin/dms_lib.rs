//! dms_lib

use anyhow::Result;
use docopt::Docopt;
use martian::prelude::*;
use serde::Deserialize;

const HEADER: &str = "# DMS analysis step tools";

const USAGE: &str = "
DMS step tool stages
Usage:
  dms_lib martian <adapter>...
  dms_lib mro [--file=<filename>] [--rewrite]
  dms_lib --help
Options:
     --help            Show this screen.
";

#[derive(Deserialize)]
struct Args {
    // Martian interface
    cmd_martian: bool,
    cmd_mro: bool,
    arg_adapter: Vec<String>,
    flag_file: Option<String>,
    flag_rewrite: bool,
}

fn main() -> Result<()> {
    use dms_lib::stages::*;

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    let (stage_registry, mro_registry) = martian_stages![
        RunApe,
        RunBrukerDa,
        RunGlyqIq,
        RunMaxQuant,
        RunOmssa,
        StageApeResources,
        StageBrukerDaResources,
        StageGlyqIqResources,
        StageMaxqResources,
        StageOmssaResources,
    ];

    if args.cmd_martian {
        let adapter = MartianAdapter::new(stage_registry);

        // The pipeline log only needs warnings from the step tools.
        let adapter = adapter.log_level(LevelFilter::Warn);

        let retcode = adapter.run(args.arg_adapter);
        std::process::exit(retcode);
    } else if args.cmd_mro {
        martian_make_mro(HEADER, args.flag_file, args.flag_rewrite, mro_registry)?;
    } else {
        unimplemented!()
    }
    Ok(())
}
