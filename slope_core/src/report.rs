//! # Text Reports
//!
//! Plain-text renderings of analysis results for terminals and log files.
//! Each report is a `Display` wrapper, so it can be written straight into any
//! formatter or turned into a `String`.
//!
//! ```rust
//! use slope_core::calculations::{analyze_bishop, AnalysisInput};
//! use slope_core::report::bishop_report;
//! use slope_core::settings::AnalysisSettings;
//!
//! let result = analyze_bishop(&AnalysisInput::demo().unwrap(), &AnalysisSettings::default()).unwrap();
//! let text = bishop_report(&result);
//! assert!(text.contains("BISHOP MODIFIED"));
//! ```

use std::fmt::{self, Display, Formatter};

use crate::calculations::{BishopResult, FelleniusResult, MethodComparison};
use crate::geometry::Slice;

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Fellenius result as text.
pub struct FelleniusReport<'a>(pub &'a FelleniusResult);

/// Bishop Modified result as text, including the iteration history.
pub struct BishopReport<'a>(pub &'a BishopResult);

/// Side-by-side comparison as text.
pub struct ComparisonReport<'a>(pub &'a MethodComparison);

pub fn fellenius_report(result: &FelleniusResult) -> String {
    FelleniusReport(result).to_string()
}

pub fn bishop_report(result: &BishopResult) -> String {
    BishopReport(result).to_string()
}

pub fn comparison_report(comparison: &MethodComparison) -> String {
    ComparisonReport(comparison).to_string()
}

fn status_icon(ok: bool) -> &'static str {
    if ok {
        "[OK]"
    } else {
        "[INVALID]"
    }
}

fn header(f: &mut Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", RULE)?;
    writeln!(f, "  {}", title)?;
    writeln!(f, "{}", RULE)
}

/// One row per slice; `extra` supplies an optional trailing column.
fn slice_table(
    f: &mut Formatter<'_>,
    slices: &[Slice],
    resisting: &[f64],
    driving: &[f64],
    extra: Option<(&str, &[f64])>,
) -> fmt::Result {
    write!(
        f,
        "{:>4} {:>8} {:>7} {:>7} {:>9} {:>7} {:>9} {:>9}",
        "#", "x (m)", "h (m)", "a (deg)", "W (kN)", "u (kPa)", "R (kN)", "D (kN)"
    )?;
    match extra {
        Some((label, _)) => writeln!(f, " {:>7}", label)?,
        None => writeln!(f)?,
    }
    writeln!(f, "{}", THIN_RULE)?;

    for (i, s) in slices.iter().enumerate() {
        write!(
            f,
            "{:>4} {:>8.2} {:>7.2} {:>7.1} {:>9.1} {:>7.1} {:>9.1} {:>9.1}",
            s.index,
            s.x_center_m,
            s.height_m,
            s.alpha_degrees(),
            s.weight_kn,
            s.pore_pressure_kpa,
            resisting.get(i).copied().unwrap_or(f64::NAN),
            driving.get(i).copied().unwrap_or(f64::NAN),
        )?;
        if let Some((_, values)) = extra {
            write!(f, " {:>7.3}", values.get(i).copied().unwrap_or(f64::NAN))?;
        }
        if s.in_tension {
            write!(f, "  T")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn warnings(f: &mut Formatter<'_>, warnings: &[String]) -> fmt::Result {
    if warnings.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "Warnings:")?;
    for w in warnings {
        writeln!(f, "  - {}", w)?;
    }
    Ok(())
}

impl Display for FelleniusReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let r = self.0;
        header(f, "FELLENIUS (ORDINARY METHOD OF SLICES)")?;
        writeln!(f)?;
        writeln!(f, "Slices:            {} ({} discarded)", r.slices.len(), r.discarded_slices)?;
        writeln!(f, "Sum resisting:     {:.2} kN", r.sum_resisting_kn)?;
        writeln!(f, "Sum driving:       {:.2} kN", r.sum_driving_kn)?;
        writeln!(f, "Resisting moment:  {:.1} kN·m", r.resisting_moment_knm)?;
        writeln!(f, "Driving moment:    {:.1} kN·m", r.driving_moment_knm)?;
        writeln!(f)?;
        slice_table(f, &r.slices, &r.resisting_forces_kn, &r.driving_forces_kn, None)?;
        warnings(f, &r.warnings)?;
        writeln!(f)?;
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "  FS = {:.3}  {}  {}",
            r.factor_of_safety,
            r.classification,
            status_icon(r.is_valid)
        )?;
        writeln!(f, "{}", RULE)
    }
}

impl Display for BishopReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let r = self.0;
        header(f, "BISHOP MODIFIED METHOD")?;
        writeln!(f)?;
        writeln!(f, "Slices:            {} ({} discarded)", r.slices.len(), r.discarded_slices)?;
        writeln!(f, "Initial FS:        {:.3}", r.initial_fs)?;
        writeln!(f, "Tolerance:         {}", r.tolerance)?;
        writeln!(f, "Iterations:        {}", r.iterations)?;
        writeln!(f, "Sum resisting:     {:.2} kN", r.sum_resisting_kn)?;
        writeln!(f, "Sum driving:       {:.2} kN", r.sum_driving_kn)?;
        writeln!(f)?;
        slice_table(
            f,
            &r.slices,
            &r.resisting_forces_kn,
            &r.driving_forces_kn,
            Some(("m_a", &r.m_alpha)),
        )?;

        writeln!(f)?;
        writeln!(f, "Convergence history:")?;
        writeln!(f, "{:>6} {:>12} {:>12}", "iter", "FS", "delta")?;
        for (k, fs) in r.fs_history.iter().enumerate() {
            match k.checked_sub(1).map(|p| (fs - r.fs_history[p]).abs()) {
                Some(delta) => writeln!(f, "{:>6} {:>12.6} {:>12.6}", k, fs, delta)?,
                None => writeln!(f, "{:>6} {:>12.6} {:>12}", k, fs, "-")?,
            }
        }

        warnings(f, &r.warnings)?;
        writeln!(f)?;
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "  FS = {:.3}  {}  {}",
            r.factor_of_safety,
            r.classification,
            status_icon(r.is_valid)
        )?;
        writeln!(f, "{}", RULE)
    }
}

impl Display for ComparisonReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let c = self.0;
        header(f, "METHOD COMPARISON")?;
        writeln!(f)?;
        writeln!(f, "{:<18} {:>10} {:>12} {:>10}", "Method", "FS", "Class", "Valid")?;
        writeln!(f, "{}", THIN_RULE)?;
        writeln!(
            f,
            "{:<18} {:>10.3} {:>12} {:>10}",
            "Fellenius",
            c.fs_fellenius,
            c.fellenius.classification.to_string(),
            status_icon(c.fellenius.is_valid)
        )?;
        writeln!(
            f,
            "{:<18} {:>10.3} {:>12} {:>10}",
            "Bishop Modified",
            c.fs_bishop,
            c.bishop.classification.to_string(),
            status_icon(c.bishop.is_valid)
        )?;
        writeln!(f)?;
        writeln!(f, "Difference:        {:+.3} ({:+.1}%)", c.difference, c.difference_percent)?;
        writeln!(f, "More conservative: {}", c.more_conservative)?;
        writeln!(f, "Bishop iterations: {}", c.bishop.iterations)?;
        writeln!(f)?;
        for rec in &c.recommendations {
            writeln!(f, "  * {}", rec)?;
        }
        writeln!(f, "{}", RULE)
    }
}
