//! Plain-text terminal summaries.
//!
//! The engine's API is the structured records in `domain`; this module only
//! renders them, so output changes stay local.

use crate::domain::{AnalysisConfig, BayesFactorResult, ConvergenceReport, EvidenceEstimate, ModelKind, PriorSet};

/// R-hat above this is marked as not converged in tables.
pub const R_HAT_WARN: f64 = 1.1;

pub fn format_run_header(config: &AnalysisConfig, data_label: &str) -> String {
    let mut out = String::new();
    out.push_str("=== brane - Bayesian model comparison ===\n");
    out.push_str(&format!("Data: {data_label}\n"));
    out.push_str(&format!(
        "Sampler: walkers={} steps={} discard={} a={} seed={}\n",
        config.n_walkers, config.n_steps, config.discard, config.stretch_scale, config.seed
    ));
    out
}

/// Per-parameter convergence table for one model.
pub fn format_convergence(kind: ModelKind, report: &ConvergenceReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} (n={} after discard={}, acceptance={:.3})\n",
        kind.display_name(),
        report.n_samples,
        report.discard,
        report.acceptance_fraction
    ));

    out.push_str(
        format!(
            "  {:<10} {:>12} {:>12} {:>12} {:>25} {:>25} {:>8} {:>9}",
            "param", "mean", "std", "median", "68% interval", "95% interval", "R-hat", "ESS"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "  {:-<10} {:-<12} {:-<12} {:-<12} {:-<25} {:-<25} {:-<8} {:-<9}",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for p in &report.params {
        let flag = if p.r_hat > R_HAT_WARN || p.r_hat.is_nan() { " !" } else { "" };
        out.push_str(
            format!(
                "  {:<10} {:>12} {:>12} {:>12} {:>25} {:>25} {:>8} {:>9}{flag}",
                truncate(&p.name, 10),
                fmt_num(p.mean),
                fmt_num(p.std),
                fmt_num(p.median),
                format!("[{}, {}]", fmt_num(p.q16), fmt_num(p.q84)),
                format!("[{}, {}]", fmt_num(p.q025), fmt_num(p.q975)),
                fmt_fixed(p.r_hat, 4),
                fmt_fixed(p.ess, 0),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_evidence(kind: ModelKind, evidence: &EvidenceEstimate) -> String {
    format!(
        "{:<18} ln Z = {} ± {} (n={})\n",
        kind.display_name(),
        fmt_fixed(evidence.log_evidence, 3),
        fmt_fixed(evidence.error, 3),
        evidence.n_samples
    )
}

pub fn format_bayes_factor(a: ModelKind, b: ModelKind, bf: &BayesFactorResult) -> String {
    format!(
        "ln K ({} vs {}) = {} ± {} -> {}\n",
        a.display_name(),
        b.display_name(),
        fmt_fixed(bf.log_k, 3),
        fmt_fixed(bf.combined_error, 3),
        bf.strength.label()
    )
}

/// Bayes factor per prior set, one row each.
pub fn format_sensitivity(a: ModelKind, b: ModelKind, rows: &[(PriorSet, BayesFactorResult)]) -> String {
    let mut out = format!("Prior sensitivity of ln K ({} vs {}):\n", a.display_name(), b.display_name());
    out.push_str(format!("  {:<14} {:>10} {:>10}  {}", "prior set", "ln K", "error", "evidence").trim_end());
    out.push('\n');
    out.push_str(format!("  {:-<14} {:-<10} {:-<10}  {:-<22}", "", "", "", "").trim_end());
    out.push('\n');
    for (set, bf) in rows {
        out.push_str(&format!(
            "  {:<14} {:>10} {:>10}  {}\n",
            set.slug(),
            fmt_fixed(bf.log_k, 3),
            fmt_fixed(bf.combined_error, 3),
            bf.strength.label()
        ));
    }
    out
}

/// Short numeric form; scientific notation outside `[1e-3, 1e6)`.
fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e6).contains(&a) {
        format!("{v:.4e}")
    } else {
        format!("{v:.5}")
    }
}

fn fmt_fixed(v: f64, decimals: usize) -> String {
    if v.is_finite() { format!("{v:.decimals$}") } else { v.to_string() }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
