use docopt::Docopt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{Error, ErrorKind, Result, Write};
use tracing::{debug, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use windowed_median::check::{builtin_scenarios, verify, VerifyConfig};
use windowed_median::stream::{open_reader, open_writer, write_running_medians, IntegerStream};
use windowed_median::MedianError;

const USAGE: &'static str = "
Usage: wmed run [options] <window> [<input>]
       wmed verify [options]

Options:
    -h              Show this help message.
    -v              Produce verbose output.
    -o FILE         Write output to FILE instead of stdout (\".gz\" compresses).
    -x              Print exact medians (rationals) instead of floats.
    -s SEED         Seed for random verification streams. [default: 19]
    -n NUM          Number of random verification trials. [default: 92]
    -L NUM          Maximum random stream length. [default: 20]
    -W NUM          Maximum random window size. [default: 10]
    --yaml          Render the verification report as YAML instead of JSON.
";

fn parse_arg<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|err| Error::new(ErrorKind::InvalidInput, format!("{}: {}", name, err)))
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let args = Docopt::new(USAGE)
        .and_then(|dopt| dopt.parse())
        .unwrap_or_else(|e| e.exit());

    let verbose = args.get_bool("-v");
    init_tracing(verbose);
    debug!("{:?}", args);

    let out_name = if args.get_str("-o").len() == 0 {
        "-"
    } else {
        args.get_str("-o")
    };

    if args.get_bool("run") {
        let window: i64 = parse_arg("<window>", args.get_str("<window>"))?;
        if window <= 0 {
            return Err(MedianError::InvalidArgument {
                name: "window size",
                value: window,
            }
            .into());
        }
        let in_name = if args.get_str("<input>").len() == 0 {
            "-"
        } else {
            args.get_str("<input>")
        };
        let reader = open_reader(in_name)?;
        let values: IntegerStream<_, i64> = IntegerStream::new(reader);
        let mut out = open_writer(out_name)?;
        let exact = args.get_bool("-x");
        let n = write_running_medians(out.as_mut(), window as usize, values, exact)?;
        info!(input = in_name, window, rows = n, "wrote running medians");
    }

    if args.get_bool("verify") {
        let config = VerifyConfig {
            seed: parse_arg("-s", args.get_str("-s"))?,
            trials: parse_arg("-n", args.get_str("-n"))?,
            max_len: parse_arg("-L", args.get_str("-L"))?,
            max_window: parse_arg("-W", args.get_str("-W"))?,
        };
        let scenarios = builtin_scenarios();

        let opt_prog = if verbose {
            let prog = ProgressBar::new((scenarios.len() + config.trials) as u64);
            let sty = ProgressStyle::with_template(
                "{prefix} [{elapsed_precise}] [{wide_bar}] {percent}% ({pos}/{len})",
            )
            .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?;
            prog.set_style(sty);
            prog.set_prefix("verify");
            Some(prog)
        } else {
            None
        };

        let report = verify(&config, &scenarios, opt_prog.as_ref())?;
        if let Some(prog) = &opt_prog {
            prog.finish();
        }

        let text = if args.get_bool("--yaml") {
            serde_yaml::to_string(&report)
                .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?
        } else {
            serde_json::to_string_pretty(&report)?
        };
        let mut out = open_writer(out_name)?;
        writeln!(out, "{}", text)?;
        out.flush()?;

        info!(
            streams = report.streams,
            passed = report.passed,
            "verification finished"
        );
        if !report.ok() {
            return Err(Error::new(
                ErrorKind::Other,
                format!("{} of {} streams failed", report.failures.len(), report.streams),
            ));
        }
    }
    Ok(())
}
