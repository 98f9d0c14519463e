//! Formatted terminal output.
//!
//! Formatting lives in one place so the processing code stays free of
//! presentation details.

use crate::fit::ExtrapolationFit;
use crate::io::RunMetadata;
use crate::process::Counters;

/// `part / whole` as a percentage, 0 when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// End-of-run summary: efficiencies, rejection breakdown and extrapolations.
pub fn format_run_summary(meta: &RunMetadata, counters: &Counters, fits: &[ExtrapolationFit]) -> String {
    let mut out = String::new();

    out.push_str("=== gammajet - photon+jet finalizer ===\n");
    out.push_str(&format!(
        "Dataset: {} ({}, {})\n",
        meta.dataset,
        meta.postfix,
        if meta.is_mc { "simulation" } else { "data" }
    ));
    out.push_str(&format!(
        "Events: [{}, {}) | processed {}{}\n",
        meta.range.from,
        meta.range.to,
        counters.total,
        if meta.interrupted { " (interrupted)" } else { "" }
    ));
    if !meta.is_mc {
        out.push_str(&format!("Luminosity: {:.3} /pb\n", meta.luminosity));
    }
    out.push_str(&format!("Alpha cut: {}\n", meta.alpha_cut));

    out.push_str(&format!(
        "\nSelection efficiency: {:.2}% ({} / {})\n",
        percent(counters.passed, counters.total),
        counters.passed,
        counters.total
    ));
    out.push_str(&format!(
        "Trigger efficiency: {:.2}% ({} / {})\n",
        percent(counters.passed_trigger, counters.total),
        counters.passed_trigger,
        counters.total
    ));
    out.push_str(&format!(
        "Trigger rejections: {} | not found {:.2}% | pt out of range {:.2}%\n",
        counters.rejected_trigger,
        percent(counters.rejected_trigger_not_found, counters.rejected_trigger),
        percent(counters.rejected_trigger_pt_out, counters.rejected_trigger),
    ));

    out.push_str("\nRejected events:\n");
    for (reason, n) in counters.skips() {
        out.push_str(&format!(
            "  {reason:<28} {n:>10} ({:.2}%)\n",
            percent(n, counters.total)
        ));
    }

    if !fits.is_empty() {
        out.push_str("\nResponse extrapolated to alpha = 0:\n");
        for fit in fits {
            out.push_str(&format!(
                "  {:<36} {:.4} +- {:.4}  chi2/ndf={:.2}/{}\n",
                fit.name, fit.response, fit.response_error, fit.chi2, fit.ndf
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EventRange;

    fn meta(interrupted: bool) -> RunMetadata {
        RunMetadata {
            dataset: "Photon_Run2012A".into(),
            postfix: "PFlowAK5chs".into(),
            is_mc: false,
            alpha_cut: 0.2,
            luminosity: 12.5,
            range: EventRange::all(100),
            interrupted,
            inputs: vec![],
            generated_at: String::new(),
        }
    }

    #[test]
    fn summary_reports_efficiencies() {
        let counters = Counters {
            total: 200,
            passed: 50,
            passed_trigger: 150,
            rejected_trigger: 50,
            rejected_trigger_not_found: 40,
            rejected_trigger_pt_out: 10,
            back_to_back: 100,
            ..Default::default()
        };
        let text = format_run_summary(&meta(false), &counters, &[]);
        assert!(text.contains("Selection efficiency: 25.00% (50 / 200)"));
        assert!(text.contains("Trigger efficiency: 75.00%"));
        assert!(text.contains("not found 80.00%"));
        assert!(text.contains("back_to_back"));
        assert!(text.contains("Luminosity: 12.500 /pb"));
        assert!(!text.contains("interrupted"));
    }

    #[test]
    fn empty_run_has_no_nan() {
        let text = format_run_summary(&meta(true), &Counters::default(), &[]);
        assert!(!text.contains("NaN"));
        assert!(text.contains("(interrupted)"));
    }
}
