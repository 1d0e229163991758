// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use lsm_reinit::io;
use lsm_reinit::{
    Field, FieldView, LsmReal, ReinitError, ReinitInputs, ReinitKernel, SignFunction, SignMode,
};

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SignKind {
    /// Exact sign with an optional zero band (see --zero-tol)
    Sharp,
    /// phi / sqrt(phi^2 + dx^2) with dx the smallest grid spacing
    Smooth,
}

#[derive(Parser)]
#[command(
    name = "reinit-rhs",
    about = "Right-hand side of the level set reinitialization equation"
)]
struct Cli {
    /// Level set function (.npy or .mat); its rank sets the dimension (1-3)
    #[arg(long)]
    phi: PathBuf,

    /// Ghost cell width of phi
    #[arg(short = 'g', long)]
    ghost_width: usize,

    /// Plus one-sided derivative, one per axis in axis order (repeatable)
    #[arg(long, num_args = 1)]
    plus: Vec<PathBuf>,

    /// Minus one-sided derivative, one per axis in axis order (repeatable)
    #[arg(long, num_args = 1)]
    minus: Vec<PathBuf>,

    /// Grid spacing per axis, comma-separated (e.g., 0.1,0.1)
    #[arg(long)]
    spacing: String,

    /// Frozen reference field; when given, upwinding uses sign(phi0)
    #[arg(long)]
    phi0: Option<PathBuf>,

    /// Sign function used to orient upwinding
    #[arg(long, value_enum, default_value = "sharp")]
    sign: SignKind,

    /// Values with |v| <= zero-tol count as lying on the interface (sharp sign)
    #[arg(long, default_value = "0.0")]
    zero_tol: f64,

    /// Number of Rayon worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Output file path (.npy or .mat)
    #[arg(short = 'o', long, default_value = "reinit_rhs.npy")]
    output: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_spacing<const N: usize>(s: &str) -> Result<[LsmReal; N]> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("invalid --spacing: expected comma-separated floats")?;
    if parts.len() != N {
        return Err(ReinitError::ArgumentCount {
            what: "grid spacing values",
            expected: N,
            got: parts.len(),
        }
        .into());
    }
    let mut spacing = [0.0 as LsmReal; N];
    for (h, &p) in spacing.iter_mut().zip(parts.iter()) {
        *h = p as LsmReal;
    }
    Ok(spacing)
}

fn derivative_name(axis: usize, side: &str) -> String {
    format!("phi_{}_{}", AXIS_NAMES[axis], side)
}

fn load_derivatives<const N: usize>(
    paths: &[PathBuf],
    side: &str,
) -> Result<Vec<Field<LsmReal, N>>> {
    if paths.len() != N {
        return Err(ReinitError::ArgumentCount {
            what: if side == "plus" {
                "--plus derivative files"
            } else {
                "--minus derivative files"
            },
            expected: N,
            got: paths.len(),
        }
        .into());
    }
    paths
        .iter()
        .enumerate()
        .map(|(axis, path)| {
            let name = derivative_name(axis, side);
            io::load_field::<LsmReal, N>(path, &name)
                .with_context(|| format!("loading {} from {}", name, path.display()))
        })
        .collect()
}

fn views<const N: usize>(fields: &[Field<LsmReal, N>]) -> [FieldView<'_, LsmReal, N>; N] {
    std::array::from_fn(|d| fields[d].view())
}

fn run<const N: usize>(cli: &Cli) -> Result<()> {
    let phi: Field<LsmReal, N> = io::load_field(&cli.phi, "phi")
        .with_context(|| format!("loading phi from {}", cli.phi.display()))?;
    let plus = load_derivatives::<N>(&cli.plus, "plus")?;
    let minus = load_derivatives::<N>(&cli.minus, "minus")?;
    let spacing = parse_spacing::<N>(&cli.spacing)?;

    let phi0: Option<Field<LsmReal, N>> = match &cli.phi0 {
        Some(path) => Some(
            io::load_field(path, "phi0")
                .with_context(|| format!("loading phi0 from {}", path.display()))?,
        ),
        None => None,
    };
    let sign_mode = match &phi0 {
        Some(field) => SignMode::Frozen(field.view()),
        None => SignMode::Phi,
    };

    let inputs = ReinitInputs::new(
        phi.view(),
        cli.ghost_width,
        views(&plus),
        views(&minus),
        spacing,
        sign_mode,
    )?;

    let sign_function = match cli.sign {
        SignKind::Sharp => SignFunction::sharp(cli.zero_tol as LsmReal)
            .context("invalid --zero-tol")?,
        SignKind::Smooth => SignFunction::smoothed_for_spacing(&spacing),
    };
    let mut kernel = ReinitKernel::new().with_sign_function(sign_function);
    if let Some(threads) = cli.threads {
        kernel = kernel.with_threads(threads);
    }

    info!(
        "computing {}D reinitialization RHS over {} (fill box {}, {}-precision)",
        N,
        phi.grid_box(),
        inputs.fill_box(),
        <LsmReal as lsm_reinit::Real>::PRECISION
    );
    let rhs = kernel.compute(&inputs)?;

    io::save_field(&rhs, &cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!("wrote {}", cli.output.display());

    Ok(())
}

fn field_rank(path: &Path) -> Result<usize> {
    // Try each supported rank; only the matching one loads cleanly.
    for ndim in 1..=3 {
        let attempt = match io::infer_format(path)? {
            io::FileFormat::Npy => io::load_npy_field::<LsmReal>(path, "phi", ndim).map(|_| ()),
            io::FileFormat::Mat => io::load_mat_field::<LsmReal>(path, "phi", ndim).map(|_| ()),
        };
        match attempt {
            Ok(()) => return Ok(ndim),
            Err(ReinitError::DimensionMismatch { .. }) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    bail!("phi should be a 1, 2 or 3 dimensional array")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("failed to initialize logger")?;

    if cli.threads == Some(0) {
        bail!("--threads must be at least 1");
    }

    match field_rank(&cli.phi)? {
        1 => run::<1>(&cli),
        2 => run::<2>(&cli),
        3 => run::<3>(&cli),
        n => bail!("unsupported dimension {}", n),
    }
}
