mod input;
mod provenance;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use input::{nested, parse_matrix, FibrationFile};
use lefschetz::lattice::{determinant, rows_repr};
use lefschetz::monodromy::MonodromyMatrix;
use lefschetz::resolve::decompose;
use lefschetz::{Fibration, FibrationCfg, FormParity};
use provenance::{document, write_sidecar, Payload};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "lefschetz")]
#[command(about = "Homology of Lefschetz fibrations from monodromy data")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Reconstruct homology and intersection form; write JSON plus a provenance sidecar
    Homology {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        flags: CfgFlags,
        /// Also resolve singular fibres and report the smoothed model
        #[arg(long)]
        smoothing: bool,
    },
    /// Print the elementary factors of one monodromy matrix
    Decompose {
        /// Nested row list, e.g. '[[1,3],[0,1]]'
        #[arg(long)]
        matrix: String,
    },
    /// Print a small provenance JSON block
    Report,
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct CfgFlags {
    /// Skip unimodularity and defect-rank checks (debug mode)
    #[arg(long)]
    relaxed: bool,
    /// Antisymmetric form (curves); overrides the input's `parity`
    #[arg(long)]
    odd: bool,
    /// Do not append the hyperbolic block to the projected form
    #[arg(long)]
    no_block: bool,
}

impl CfgFlags {
    fn cfg(self, file: &FibrationFile) -> FibrationCfg {
        let parity = if self.odd {
            FormParity::Odd
        } else {
            file.parity.map(FormParity::from).unwrap_or_default()
        };
        FibrationCfg {
            relaxed: self.relaxed,
            parity,
            extend_with_block: !self.no_block,
            ..FibrationCfg::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct HomologyReport {
    fibre_rank: usize,
    points: usize,
    has_point_at_infinity: bool,
    thimbles: usize,
    extensions: Vec<Vec<i64>>,
    infinity_loops: Vec<Vec<i64>>,
    homology: Vec<Vec<i64>>,
    integral_repair: bool,
    intersection_form: Vec<Vec<i64>>,
    determinant: i128,
    #[serde(skip_serializing_if = "Option::is_none")]
    smoothing: Option<SmoothingReport>,
}

#[derive(Debug, Serialize)]
struct SmoothingReport {
    thimbles: usize,
    homology: Vec<Vec<i64>>,
    intersection_form: Vec<Vec<i64>>,
    determinant: i128,
    trivial_lattice: Vec<Vec<i64>>,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Homology {
            input,
            out,
            flags,
            smoothing,
        } => homology(&input, &out, flags, smoothing).map(|_| ()),
        Action::Decompose { matrix } => decompose_cmd(&matrix),
        Action::Report => report(),
    }
}

fn homology(input: &Path, out: &Path, flags: CfgFlags, smoothing: bool) -> Result<PathBuf> {
    tracing::info!(input = %input.display(), out = %out.display(), ?flags, smoothing, "homology");
    let file = FibrationFile::read(input)?;
    let fib =
        Fibration::new(file.to_input()?, flags.cfg(&file)).context("reconstructing homology")?;
    let form = fib.intersection_form().context("assembling intersection form")?;

    let smoothing_report = if smoothing {
        let s = fib.smoothing().context("resolving singular fibres")?;
        let smoothed_form = fib
            .smoothing_intersection_form()
            .context("assembling smoothed intersection form")?;
        Some(SmoothingReport {
            thimbles: s.thimble_count(),
            homology: nested(&s.homology().representatives),
            intersection_form: nested(smoothed_form),
            determinant: determinant(smoothed_form)?,
            trivial_lattice: nested(&s.trivial_lattice()?),
        })
    } else {
        None
    };

    let report = HomologyReport {
        fibre_rank: fib.fibre_rank(),
        points: fib.monodromy_matrices().len(),
        has_point_at_infinity: fib.has_point_at_infinity(),
        thimbles: fib.boundary().thimble_count(),
        extensions: nested(fib.extensions()),
        infinity_loops: nested(fib.infinity_loops()),
        homology: nested(&fib.homology().representatives),
        integral_repair: fib.homology().repaired,
        intersection_form: nested(form),
        determinant: determinant(form)?,
        smoothing: smoothing_report,
    };

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    fs::write(out, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("writing {}", out.display()))?;

    let payload = Payload::new(
        "homology",
        json!({
            "relaxed": flags.relaxed,
            "parity": format!("{:?}", fib.cfg().parity),
            "extend_with_block": fib.cfg().extend_with_block,
            "smoothing": smoothing,
        }),
    )
    .with_input(input);
    let sidecar = write_sidecar(out, payload)?;
    tracing::info!(
        homology_rank = fib.homology().rank(),
        determinant = report.determinant,
        sidecar = %sidecar.display(),
        "wrote homology"
    );
    Ok(sidecar)
}

fn decompose_cmd(matrix: &str) -> Result<()> {
    let m = MonodromyMatrix::new(parse_matrix(matrix)?)?;
    let factors = decompose(0, &m).context("decomposing monodromy matrix")?;
    tracing::info!(factors = factors.len(), "decompose");
    for f in &factors {
        println!("{}", rows_repr(f.matrix()));
    }
    Ok(())
}

fn report() -> Result<()> {
    let doc = document(&Payload::new("report", json!({})), &[]);
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
