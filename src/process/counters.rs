//! Run-scoped event counters.

use serde::Serialize;

/// Why an event left the chain before accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingObjects,
    TriggerNotFound,
    TriggerPtOut,
    BackToBack,
    FirstJetPt,
    McComparison,
    PtNotCovered,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::MissingObjects => "missing_objects",
            SkipReason::TriggerNotFound => "rejected_trigger_not_found",
            SkipReason::TriggerPtOut => "rejected_trigger_pt_out",
            SkipReason::BackToBack => "back_to_back",
            SkipReason::FirstJetPt => "first_jet_pt",
            SkipReason::McComparison => "mc_comparison",
            SkipReason::PtNotCovered => "pt_not_covered",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Events visited.
    pub total: u64,
    /// Events that reached the response families.
    pub passed: u64,
    pub passed_trigger: u64,
    pub rejected_trigger: u64,
    pub rejected_trigger_not_found: u64,
    pub rejected_trigger_pt_out: u64,
    pub missing_objects: u64,
    pub back_to_back: u64,
    pub first_jet_pt: u64,
    pub mc_comparison: u64,
    pub pt_not_covered: u64,
}

impl Counters {
    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingObjects => self.missing_objects += 1,
            SkipReason::TriggerNotFound => {
                self.rejected_trigger += 1;
                self.rejected_trigger_not_found += 1;
            }
            SkipReason::TriggerPtOut => {
                self.rejected_trigger += 1;
                self.rejected_trigger_pt_out += 1;
            }
            SkipReason::BackToBack => self.back_to_back += 1,
            SkipReason::FirstJetPt => self.first_jet_pt += 1,
            SkipReason::McComparison => self.mc_comparison += 1,
            SkipReason::PtNotCovered => self.pt_not_covered += 1,
        }
    }

    /// Per-reason breakdown, in gate order.
    pub fn skips(&self) -> [(&'static str, u64); 7] {
        [
            ("missing_objects", self.missing_objects),
            ("rejected_trigger_not_found", self.rejected_trigger_not_found),
            ("rejected_trigger_pt_out", self.rejected_trigger_pt_out),
            ("back_to_back", self.back_to_back),
            ("first_jet_pt", self.first_jet_pt),
            ("mc_comparison", self.mc_comparison),
            ("pt_not_covered", self.pt_not_covered),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_rejections_update_both_counters() {
        let mut c = Counters::default();
        c.record_skip(SkipReason::TriggerNotFound);
        c.record_skip(SkipReason::TriggerPtOut);
        assert_eq!(c.rejected_trigger, 2);
        assert_eq!(c.rejected_trigger_not_found, 1);
        assert_eq!(c.rejected_trigger_pt_out, 1);
        assert_eq!(c.skips().iter().map(|(_, n)| n).sum::<u64>(), 2);
    }
}
